//! Settings module of a Telegram userbot: feature flags, the NoNick
//! allowlists, watcher suppression rules, the web dashboard tunnel and
//! self-uninstallation.

pub mod db;
pub mod error;
pub mod modules;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

use services::channel_join::ChannelJoinService;
use services::config_file::GlobalConfig;
use services::env::Settings;
use services::flags::FlagService;
use services::host::{
    CallbackQuery, Host, IncomingMessage, InlineUi, Markup, MessageRef, Messenger, ModuleRegistry,
    Runtime,
};
use services::kv::KvStore;
use services::localization::LocalizationManager;
use services::nonick::NoNickService;
use services::prefix::PrefixService;
use services::uninstall::{UninstallStateService, Uninstaller};
use services::watchers::WatcherService;
use services::web::WebService;
use std::sync::Arc;

pub type Error = anyhow::Error;

// Custom user data passed to all command functions
pub struct Data {
    pub l10n: Arc<LocalizationManager>,
    pub settings: Settings,
    pub registry: Arc<dyn ModuleRegistry>,
    pub messenger: Arc<dyn Messenger>,
    pub inline: Arc<dyn InlineUi>,
    pub runtime: Arc<dyn Runtime>,
    pub watchers: Arc<WatcherService>,
    pub nonick: Arc<NoNickService>,
    pub flags: Arc<FlagService>,
    pub prefix: Arc<PrefixService>,
    pub web: Arc<WebService>,
    pub uninstall: Arc<UninstallStateService>,
    pub uninstaller: Arc<Uninstaller>,
    pub channel_join: Arc<ChannelJoinService>,
}

impl Data {
    pub fn new(
        kv: Arc<dyn KvStore>,
        config: Arc<GlobalConfig>,
        settings: Settings,
        host: Host,
    ) -> Self {
        let Host {
            registry,
            messenger,
            inline,
            runtime,
            dashboard,
            log_control,
        } = host;

        Self {
            watchers: Arc::new(WatcherService::new(kv.clone(), registry.clone())),
            nonick: Arc::new(NoNickService::new(kv.clone())),
            flags: Arc::new(FlagService::new(kv.clone(), config)),
            prefix: Arc::new(PrefixService::new(kv)),
            web: Arc::new(WebService::new(dashboard)),
            uninstall: Arc::new(UninstallStateService::new()),
            uninstaller: Arc::new(Uninstaller::new(
                messenger.clone(),
                inline.clone(),
                runtime.clone(),
                log_control,
            )),
            channel_join: Arc::new(ChannelJoinService::new(registry.clone(), messenger.clone())),
            l10n: Arc::new(LocalizationManager::new()),
            settings,
            registry,
            messenger,
            inline,
            runtime,
        }
    }

    /// Starts the background tasks owned by this module.
    pub fn start_runners(&self) {
        self.channel_join.clone().start_join_runner();
    }
}

/// A command invocation.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    data: &'a Data,
    message: &'a IncomingMessage,
}

impl<'a> Context<'a> {
    pub fn new(data: &'a Data, message: &'a IncomingMessage) -> Self {
        Self { data, message }
    }

    pub fn data(&self) -> &'a Data {
        self.data
    }

    pub fn message(&self) -> &'a IncomingMessage {
        self.message
    }

    pub async fn say(&self, text: impl AsRef<str>) -> Result<MessageRef, Error> {
        self.data.messenger.answer(self.message, text.as_ref()).await
    }
}

/// A button press on one of our forms.
#[derive(Clone, Copy)]
pub struct CallbackContext<'a> {
    data: &'a Data,
    call: &'a CallbackQuery,
}

impl<'a> CallbackContext<'a> {
    pub fn new(data: &'a Data, call: &'a CallbackQuery) -> Self {
        Self { data, call }
    }

    pub fn data(&self) -> &'a Data {
        self.data
    }

    pub fn call(&self) -> &'a CallbackQuery {
        self.call
    }

    pub fn form(&self) -> MessageRef {
        self.call.form
    }

    pub async fn answer(&self, text: impl AsRef<str>, show_alert: bool) -> Result<(), Error> {
        self.data
            .inline
            .answer_callback(self.call, text.as_ref(), show_alert)
            .await
    }

    pub async fn edit(&self, text: impl AsRef<str>, markup: Markup) -> Result<(), Error> {
        self.data
            .inline
            .edit(self.call.form, text.as_ref(), markup)
            .await
    }

    pub async fn delete(&self) -> Result<(), Error> {
        self.data.inline.delete(self.call.form).await
    }
}
