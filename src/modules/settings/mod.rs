pub mod callbacks;
pub mod commands;

use crate::error::CommandError;
use crate::modules::{Module, ModuleDefinition};
use crate::services::host::{CallbackQuery, IncomingMessage};
use crate::services::localization::ContextL10nExt;
use crate::{CallbackContext, Context, Data, Error};
use callbacks::SettingsCallback;
use tracing::debug;

pub const DEFINITION: ModuleDefinition = ModuleDefinition {
    id: "settings",
    name_key: "module-settings-name",
    description_key: "module-settings-description",
};

pub fn module() -> Module {
    Module {
        definition: DEFINITION,
        commands: SettingsCommand::ALL.iter().map(|c| c.name()).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCommand {
    Watchers,
    WatcherBl,
    WatcherCmd,
    NoNickUser,
    NoNickChat,
    NoNickCmd,
    NoNickCmds,
    NoNickUsers,
    NoNickChats,
    Settings,
    WebUrl,
    UninstallHikka,
    InvokeCmd,
}

impl SettingsCommand {
    pub const ALL: [SettingsCommand; 13] = [
        SettingsCommand::Watchers,
        SettingsCommand::WatcherBl,
        SettingsCommand::WatcherCmd,
        SettingsCommand::NoNickUser,
        SettingsCommand::NoNickChat,
        SettingsCommand::NoNickCmd,
        SettingsCommand::NoNickCmds,
        SettingsCommand::NoNickUsers,
        SettingsCommand::NoNickChats,
        SettingsCommand::Settings,
        SettingsCommand::WebUrl,
        SettingsCommand::UninstallHikka,
        SettingsCommand::InvokeCmd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SettingsCommand::Watchers => "watchers",
            SettingsCommand::WatcherBl => "watcherbl",
            SettingsCommand::WatcherCmd => "watchercmd",
            SettingsCommand::NoNickUser => "nonickuser",
            SettingsCommand::NoNickChat => "nonickchat",
            SettingsCommand::NoNickCmd => "nonickcmd",
            SettingsCommand::NoNickCmds => "nonickcmds",
            SettingsCommand::NoNickUsers => "nonickusers",
            SettingsCommand::NoNickChats => "nonickchats",
            SettingsCommand::Settings => "settings",
            SettingsCommand::WebUrl => "weburl",
            SettingsCommand::UninstallHikka => "uninstall_hikka",
            SettingsCommand::InvokeCmd => "invokecmd",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    async fn run(self, ctx: Context<'_>) -> Result<(), Error> {
        match self {
            SettingsCommand::Watchers => commands::watchers::watchers(ctx).await,
            SettingsCommand::WatcherBl => commands::watchers::watcherbl(ctx).await,
            SettingsCommand::WatcherCmd => commands::watchers::watchercmd(ctx).await,
            SettingsCommand::NoNickUser => commands::nonick::nonickuser(ctx).await,
            SettingsCommand::NoNickChat => commands::nonick::nonickchat(ctx).await,
            SettingsCommand::NoNickCmd => commands::nonick::nonickcmd(ctx).await,
            SettingsCommand::NoNickCmds => commands::nonick::nonickcmds(ctx).await,
            SettingsCommand::NoNickUsers => commands::nonick::nonickusers(ctx).await,
            SettingsCommand::NoNickChats => commands::nonick::nonickchats(ctx).await,
            SettingsCommand::Settings => commands::menu::settings(ctx).await,
            SettingsCommand::WebUrl => commands::web::weburl(ctx).await,
            SettingsCommand::UninstallHikka => commands::uninstall::uninstall_hikka(ctx).await,
            SettingsCommand::InvokeCmd => commands::invoke::invokecmd(ctx).await,
        }
    }
}

/// Runs the command in `message` if it is one of ours.
pub async fn handle_message(data: &Data, message: &IncomingMessage) -> Result<bool, Error> {
    let prefix = data.prefix.get().await?;
    let Some(body) = message.text.trim_start().strip_prefix(prefix.as_str()) else {
        return Ok(false);
    };
    let Some(command) = body
        .split_whitespace()
        .next()
        .and_then(SettingsCommand::from_name)
    else {
        return Ok(false);
    };

    debug!("Running {} in chat {}", command.name(), message.chat_id);
    let ctx = Context::new(data, message);

    let Err(err) = command.run(ctx).await else {
        return Ok(true);
    };

    if let Some(cmd_err) = err.downcast_ref::<CommandError>() {
        debug!("{} rejected: {}", command.name(), cmd_err);
        ctx.say(cmd_err.localize(&ctx.l10n())).await?;
        return Ok(true);
    }

    Err(err)
}

/// Handles a button press on one of our forms.
pub async fn handle_callback(data: &Data, call: &CallbackQuery) -> Result<bool, Error> {
    let callback = match call.data.parse::<SettingsCallback>() {
        Ok(callback) => callback,
        Err(_) => return Ok(false),
    };

    let ctx = CallbackContext::new(data, call);
    if call.from != data.messenger.self_id() {
        debug!("Ignoring {} pressed by {}", call.data, call.from);
        ctx.answer(ctx.l10n().t("not-owner", None), true).await?;
        return Ok(true);
    }

    match callback {
        SettingsCallback::Toggle { flag, value } => {
            commands::menu::handle_toggle(ctx, flag, value).await?
        }
        SettingsCallback::ConfirmRestart => commands::menu::confirm_restart(ctx).await?,
        SettingsCallback::Restart => commands::menu::restart(ctx).await?,
        SettingsCallback::ConfirmUpdate => commands::menu::confirm_update(ctx).await?,
        SettingsCallback::Update => commands::menu::update(ctx).await?,
        SettingsCallback::UninstallStep2 => commands::uninstall::second_step(ctx).await?,
        SettingsCallback::UninstallConfirm => commands::uninstall::confirm(ctx).await?,
        SettingsCallback::UninstallCancel => commands::uninstall::cancel(ctx).await?,
        SettingsCallback::WebForce => commands::web::open_tunnel(ctx).await?,
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::flags::FeatureFlag;
    use crate::services::host::MessageRef;
    use crate::services::kv::MAIN_NAMESPACE;
    use crate::services::prefix::PREFIX_KEY;
    use crate::testing::TestEnv;
    use serde_json::json;

    #[test]
    fn test_command_names() {
        assert_eq!(
            SettingsCommand::from_name("UNINSTALL_HIKKA"),
            Some(SettingsCommand::UninstallHikka)
        );
        assert_eq!(SettingsCommand::from_name("help"), None);
        assert_eq!(module().commands.len(), 13);
    }

    #[tokio::test]
    async fn test_ignores_foreign_messages() {
        let env = TestEnv::new();

        let msg = env.group_message(-100, "hello there");
        assert!(!handle_message(&env.data, &msg).await.unwrap());

        let msg = env.group_message(-100, ".help");
        assert!(!handle_message(&env.data, &msg).await.unwrap());

        let msg = env.group_message(-100, "!watchers");
        assert!(!handle_message(&env.data, &msg).await.unwrap());
        assert!(env.messenger.answers().is_empty());
    }

    #[tokio::test]
    async fn test_user_errors_are_answered() {
        let env = TestEnv::new();

        let msg = env.group_message(-100, ".watcherbl");
        assert!(handle_message(&env.data, &msg).await.unwrap());
        assert!(env.messenger.last_answer().contains("You need to specify watcher name"));
    }

    #[tokio::test]
    async fn test_follows_prefix_changes() {
        let env = TestEnv::new();

        let msg = env.group_message(-100, ".watchers");
        assert!(handle_message(&env.data, &msg).await.unwrap());

        env.kv.set(MAIN_NAMESPACE, PREFIX_KEY, json!("!")).await.unwrap();
        let msg = env.group_message(-100, "!watchers");
        assert!(handle_message(&env.data, &msg).await.unwrap());
        let msg = env.group_message(-100, ".watchers");
        assert!(!handle_message(&env.data, &msg).await.unwrap());
    }

    #[tokio::test]
    async fn test_only_owner_may_press_buttons() {
        let env = TestEnv::new();
        let form = MessageRef {
            chat_id: -100,
            message_id: 500,
        };
        let press = |data: &str| CallbackQuery {
            id: "cb".into(),
            data: data.into(),
            form,
            from: 31337,
        };

        let call = press("settings:toggle:grep:1");
        assert!(handle_callback(&env.data, &call).await.unwrap());
        assert!(!env.data.flags.get(FeatureFlag::Grep).await.unwrap());

        let call = press("settings:restart:confirm");
        assert!(handle_callback(&env.data, &call).await.unwrap());
        assert!(!env.journal.contains("invoke_command restart -f"));
        assert!(!env.journal.contains("delete_form 500"));

        let call = press("settings:weburl:force");
        assert!(handle_callback(&env.data, &call).await.unwrap());
        assert_eq!(env.dashboard.starts(), 0);

        let (text, alert) = env.inline.callback_answers().last().cloned().unwrap();
        assert!(text.contains("not allowed"));
        assert!(alert);
        assert_eq!(env.inline.callback_answers().len(), 3);
    }

    #[tokio::test]
    async fn test_ignores_foreign_callbacks() {
        let env = TestEnv::new();
        let call = CallbackQuery {
            id: "cb".into(),
            data: "help:page:2".into(),
            form: env.group_message(-100, "").form_ref(),
            from: crate::testing::SELF_ID,
        };
        assert!(!handle_callback(&env.data, &call).await.unwrap());
    }
}
