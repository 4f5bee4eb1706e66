use crate::services::localization::L10nProxy;
use fluent::FluentArgs;
use thiserror::Error;

/// Failures caused by what the user typed. They abort the command without
/// touching any state and are answered with a localized message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("No arguments specified")]
    NoArgs,

    #[error("Watcher name required")]
    WatcherNameRequired,

    #[error("Watcher '{0}' not found")]
    WatcherNotFound(String),

    #[error("Reply required")]
    ReplyRequired,

    #[error("Command must be executed in a chat")]
    PrivateNotAllowed,

    #[error("Command name required")]
    CommandNameRequired,

    #[error("Command '{0}' not found")]
    CommandNotFound(String),

    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    #[error("Debug method '{0}' not found")]
    MethodNotFound(String),
}

impl CommandError {
    pub fn l10n_key(&self) -> &'static str {
        match self {
            CommandError::NoArgs => "no-args",
            CommandError::WatcherNameRequired => "watcher-name-required",
            CommandError::WatcherNotFound(_) => "watcher-not-found",
            CommandError::ReplyRequired => "reply-required",
            CommandError::PrivateNotAllowed => "private-not-allowed",
            CommandError::CommandNameRequired => "nonick-command-required",
            CommandError::CommandNotFound(_) => "command-not-found",
            CommandError::ModuleNotFound(_) => "module-not-found",
            CommandError::MethodNotFound(_) => "invoke-not-found",
        }
    }

    pub fn localize(&self, l10n: &L10nProxy) -> String {
        let mut args = FluentArgs::new();
        match self {
            CommandError::WatcherNotFound(name) => args.set("name", crate::utils::escape_html(name)),
            CommandError::ModuleNotFound(module) => {
                args.set("module", crate::utils::escape_html(module))
            }
            CommandError::MethodNotFound(method) => {
                args.set("method", crate::utils::escape_html(method))
            }
            _ => {}
        }

        l10n.t(self.l10n_key(), Some(&args))
    }
}
