//! Seams to the userbot host.
//!
//! Everything the settings module needs from the outside world (the Telegram
//! client, the inline bot, the module loader, the web dashboard) is reached
//! through the traits in this file. The host owns the implementations and
//! hands them over as a [`Host`] when building [`crate::Data`].

use crate::Error;
use crate::services::log_control::LogControl;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

pub type ChatId = i64;
pub type UserId = i64;
pub type MessageId = i32;

/// A message that triggered a command.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub is_private: bool,
    pub text: String,
    /// Sender of the message this one replies to, if any.
    pub reply_sender_id: Option<UserId>,
    pub chat_title: Option<String>,
}

impl IncomingMessage {
    /// Everything after the command word, trimmed.
    pub fn args_raw(&self) -> &str {
        self.text
            .trim()
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or("")
    }

    pub fn form_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Routed back to the module as a [`CallbackQuery`] with this data.
    Callback(String),
    Url(String),
    /// Closes the form on the host side, no callback is delivered.
    Close,
    /// Placeholder button that does nothing when pressed.
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn close(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Close,
        }
    }

    pub fn noop(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Noop,
        }
    }
}

/// Rows of buttons, top to bottom.
pub type Markup = Vec<Vec<Button>>;

/// A button press on one of our inline forms.
#[derive(Debug, Clone)]
pub struct CallbackQuery {
    pub id: String,
    pub data: String,
    pub form: MessageRef,
    pub from: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: i64,
    pub display_name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub id: i64,
    pub name: String,
    pub is_channel: bool,
    pub participants_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogFolder {
    pub id: i32,
    pub title: String,
}

/// One request/response exchange of a scripted conversation.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub sent: MessageRef,
    pub response: MessageRef,
    pub response_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Entity,
    FullUser,
    FullChannel,
    Perms,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleCounts {
    pub total: usize,
    pub core: usize,
    pub user: usize,
}

/// A channel the loader wants joined. The requester waits on the receiver
/// returned by [`ChannelJoinRequest::new`].
#[derive(Debug)]
pub struct ChannelJoinRequest {
    pub channel: String,
    reply: oneshot::Sender<bool>,
}

impl ChannelJoinRequest {
    pub fn new(channel: impl Into<String>) -> (Self, oneshot::Receiver<bool>) {
        let (reply, rx) = oneshot::channel();
        (
            Self {
                channel: channel.into(),
                reply,
            },
            rx,
        )
    }

    pub fn complete(self, joined: bool) {
        // The requester may have given up waiting
        let _ = self.reply.send(joined);
    }
}

/// The Telegram client of the account.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Id of the logged in account, used for "Saved messages" links.
    fn self_id(&self) -> UserId;

    /// Answers a command: edits our own outgoing message or replies to it.
    async fn answer(&self, message: &IncomingMessage, text: &str) -> Result<MessageRef, Error>;

    async fn get_entity(&self, id: i64) -> Result<Entity, Error>;

    async fn dialogs(&self) -> Result<Vec<Dialog>, Error>;

    async fn delete_dialog(&self, peer: i64) -> Result<(), Error>;

    async fn dialog_folders(&self) -> Result<Vec<DialogFolder>, Error>;

    async fn delete_dialog_folder(&self, folder_id: i32) -> Result<(), Error>;

    /// Sends `text` to `peer` and waits for its answer.
    async fn converse(&self, peer: &str, text: &str) -> Result<ConversationTurn, Error>;

    async fn delete_message(&self, message: MessageRef) -> Result<(), Error>;

    async fn join_channel(&self, channel: &str) -> Result<(), Error>;

    async fn log_out(&self) -> Result<(), Error>;

    fn cache_len(&self, kind: CacheKind) -> usize;

    /// Drops the cache and returns how many records it held.
    fn clear_cache(&self, kind: CacheKind) -> usize;

    async fn refresh_me(&self) -> Result<(), Error>;
}

/// The inline bot that renders forms with buttons.
#[async_trait]
pub trait InlineUi: Send + Sync {
    /// Shows a form in place of `message`. `None` means the inline bot could
    /// not deliver it (e.g. inline mode is blocked in this chat).
    async fn form(
        &self,
        message: &IncomingMessage,
        text: &str,
        markup: Markup,
    ) -> Result<Option<MessageRef>, Error>;

    async fn edit(&self, form: MessageRef, text: &str, markup: Markup) -> Result<(), Error>;

    async fn answer_callback(
        &self,
        call: &CallbackQuery,
        text: &str,
        show_alert: bool,
    ) -> Result<(), Error>;

    async fn delete(&self, form: MessageRef) -> Result<(), Error>;

    fn bot_username(&self) -> Option<String>;

    /// `None` until the inline bot finished initializing.
    fn bot_id(&self) -> Option<UserId>;
}

/// The module loader.
#[async_trait]
pub trait ModuleRegistry: Send + Sync {
    /// Display names of every module that registered a watcher.
    fn watchers(&self) -> Vec<String>;

    /// Every command name known to the dispatcher, without prefix.
    fn commands(&self) -> Vec<String>;

    fn has_module(&self, name: &str) -> bool;

    /// Methods of `module` flagged as debug-invokable.
    fn debug_methods(&self, module: &str) -> Vec<String>;

    async fn invoke_debug_method(
        &self,
        module: &str,
        method: &str,
        message: &IncomingMessage,
    ) -> Result<String, Error>;

    /// Reloads core modules, returns how many were loaded.
    async fn reload_core(&self) -> Result<usize, Error>;

    fn module_counts(&self) -> ModuleCounts;

    fn take_channel_join_request(&self) -> Option<ChannelJoinRequest>;

    /// Runs one of the host's own commands in Saved messages.
    async fn invoke_command(&self, command: &str, args: &str) -> Result<(), Error>;
}

/// Process-level primitives of the userbot.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Waits long enough to stay clear of flood limits.
    async fn flood_wait(&self);

    fn restart(&self);

    /// Library-level switch for custom emoji rendering.
    fn set_custom_emojis(&self, enabled: bool);
}

/// The web dashboard and its tunnel.
#[async_trait]
pub trait Dashboard: Send + Sync {
    fn is_running(&self) -> bool;

    async fn start(&self) -> Result<(), Error>;

    async fn url(&self, proxy_pass: bool) -> Result<String, Error>;
}

/// Host-side implementations handed to [`crate::Data::new`].
#[derive(Clone)]
pub struct Host {
    pub registry: Arc<dyn ModuleRegistry>,
    pub messenger: Arc<dyn Messenger>,
    pub inline: Arc<dyn InlineUi>,
    pub runtime: Arc<dyn Runtime>,
    pub dashboard: Arc<dyn Dashboard>,
    pub log_control: Arc<dyn LogControl>,
}
