pub mod runner;
pub mod state;

pub use runner::{UninstallReport, Uninstaller};
pub use state::{UninstallStateService, UninstallStep};

use crate::services::host::{Button, Markup};
use rand::Rng;
use rand::seq::SliceRandom;

/// Lays out the final confirmation: `options` in random order, `per_row`
/// per row, with `cancel` alone on the last row. The position of the
/// destructive option is never a reliable shortcut.
pub fn confirmation_rows<R: Rng + ?Sized>(
    mut options: Vec<Button>,
    cancel: Button,
    per_row: usize,
    rng: &mut R,
) -> Markup {
    options.shuffle(rng);

    let mut rows: Markup = options
        .chunks(per_row.max(1))
        .map(|row| row.to_vec())
        .collect();
    rows.push(vec![cancel]);
    rows
}
