use crate::Error;
use crate::services::host::{Dialog, InlineUi, Messenger, Runtime, UserId};
use crate::services::log_control::LogControl;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const BOTFATHER: &str = "@BotFather";
pub const FOLDER_TITLE: &str = "hikka";

const HOUSEKEEPING_DIALOGS: [&str; 6] = [
    "hikka-logs",
    "hikka-onload",
    "hikka-assets",
    "hikka-backups",
    "hikka-acc-switcher",
    "silent-tags",
];

/// Housekeeping channels that may also contain the inline bot.
const SHARED_DIALOGS: [&str; 2] = ["hikka-logs", "silent-tags"];

/// Dialogs created by the userbot itself, which go away with it.
pub fn is_housekeeping_dialog(dialog: &Dialog, inline_bot_id: Option<UserId>) -> bool {
    if inline_bot_id.is_some_and(|bot| dialog.id == bot) {
        return true;
    }

    if !dialog.is_channel || !HOUSEKEEPING_DIALOGS.contains(&dialog.name.as_str()) {
        return false;
    }

    match dialog.participants_count {
        Some(1) => true,
        Some(2) => SHARED_DIALOGS.contains(&dialog.name.as_str()),
        _ => false,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub bot_deleted: bool,
    pub dialogs_deleted: usize,
    pub folder_deleted: bool,
    pub logged_out: bool,
}

/// Removes every trace of the userbot from the account, then restarts.
///
/// Each step is best effort: failures are logged and the next step runs.
pub struct Uninstaller {
    messenger: Arc<dyn Messenger>,
    inline: Arc<dyn InlineUi>,
    runtime: Arc<dyn Runtime>,
    log_control: Arc<dyn LogControl>,
}

impl Uninstaller {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        inline: Arc<dyn InlineUi>,
        runtime: Arc<dyn Runtime>,
        log_control: Arc<dyn LogControl>,
    ) -> Self {
        Self {
            messenger,
            inline,
            runtime,
            log_control,
        }
    }

    pub async fn run(&self) -> UninstallReport {
        let mut report = UninstallReport::default();
        info!("Uninstalling from this account");

        // 1. Companion bot
        match self.delete_bot().await {
            Ok(deleted) => report.bot_deleted = deleted,
            Err(e) => error!("Failed to delete inline bot: {:?}", e),
        }

        // 2. Housekeeping dialogs
        match self.delete_dialogs().await {
            Ok(count) => report.dialogs_deleted = count,
            Err(e) => error!("Failed to list dialogs: {:?}", e),
        }

        // 3. Dialog folder
        match self.delete_folder().await {
            Ok(deleted) => report.folder_deleted = deleted,
            Err(e) => error!("Failed to delete dialog folder: {:?}", e),
        }

        // 4. Nothing below is worth logging anymore
        self.log_control.silence();

        // 5. Session
        self.runtime.flood_wait().await;
        match self.messenger.log_out().await {
            Ok(()) => report.logged_out = true,
            Err(e) => error!("Failed to log out: {:?}", e),
        }

        // 6. Process
        self.runtime.restart();

        report
    }

    async fn delete_bot(&self) -> Result<bool, Error> {
        let Some(username) = self.inline.bot_username() else {
            warn!("Inline bot is not initialized, skipping its deletion");
            return Ok(false);
        };

        let script = [
            "/deletebot".to_string(),
            format!("@{}", username),
            "Yes, I am totally sure.".to_string(),
        ];

        for text in &script {
            self.runtime.flood_wait().await;
            let turn = self.messenger.converse(BOTFATHER, text).await?;

            debug!(">> {}", text);
            debug!("<< {}", turn.response_text);

            self.runtime.flood_wait().await;
            for message in [turn.sent, turn.response] {
                if let Err(e) = self.messenger.delete_message(message).await {
                    warn!("Failed to delete BotFather message: {:?}", e);
                }
            }
        }

        Ok(true)
    }

    async fn delete_dialogs(&self) -> Result<usize, Error> {
        let bot_id = self.inline.bot_id();
        let mut deleted = 0;

        for dialog in self.messenger.dialogs().await? {
            if !is_housekeeping_dialog(&dialog, bot_id) {
                continue;
            }

            self.runtime.flood_wait().await;
            match self.messenger.delete_dialog(dialog.id).await {
                Ok(()) => {
                    debug!("Deleted dialog {} ({})", dialog.name, dialog.id);
                    deleted += 1;
                }
                Err(e) => error!("Failed to delete dialog {}: {:?}", dialog.name, e),
            }
        }

        Ok(deleted)
    }

    async fn delete_folder(&self) -> Result<bool, Error> {
        self.runtime.flood_wait().await;
        let folders = self.messenger.dialog_folders().await?;

        let Some(folder) = folders.iter().find(|f| f.title == FOLDER_TITLE) else {
            return Ok(false);
        };

        self.runtime.flood_wait().await;
        self.messenger.delete_dialog_folder(folder.id).await?;
        Ok(true)
    }
}
