use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Runtime control over the process-wide log filter.
pub trait LogControl: Send + Sync {
    /// Raises the threshold so that only errors get through.
    fn silence(&self);
}

/// [`LogControl`] backed by the reloadable filter installed in `main`.
pub struct ReloadLogControl {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl ReloadLogControl {
    pub fn new(handle: reload::Handle<EnvFilter, Registry>) -> Self {
        Self { handle }
    }
}

impl LogControl for ReloadLogControl {
    fn silence(&self) {
        if let Err(e) = self.handle.reload(EnvFilter::new("error")) {
            error!("Failed to raise log threshold: {:?}", e);
        }
    }
}

/// Installs the global subscriber: `RUST_LOG` (default `info`) behind a
/// reloadable filter, formatted to stdout.
pub fn init_tracing() -> ReloadLogControl {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    ReloadLogControl::new(handle)
}
