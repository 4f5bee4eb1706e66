use crate::error::CommandError;
use crate::services::localization::{ContextL10nExt, L10nProxy};
use crate::services::nonick::NoNickList;
use crate::utils::escape_html;
use crate::{Context, Error};
use fluent::FluentArgs;
use tracing::{info, warn};

fn state_label(l10n: &L10nProxy, on: bool) -> String {
    l10n.t(if on { "nonick-state-on" } else { "nonick-state-off" }, None)
}

fn target_state(l10n: &L10nProxy, target: &str, on: bool) -> String {
    let mut args = FluentArgs::new();
    args.set("target", escape_html(target));
    args.set("state", state_label(l10n, on));
    l10n.t("nonick-target-state", Some(&args))
}

/// Compose a header and bullet lines, or the empty-list notice.
fn render_list(l10n: &L10nProxy, header_key: &str, lines: Vec<String>) -> String {
    if lines.is_empty() {
        return l10n.t("nothing-to-show", None);
    }
    format!("{}\n\n{}", l10n.t(header_key, None), lines.join("\n"))
}

/// Toggle NoNick for the author of the replied message
pub async fn nonickuser(ctx: Context<'_>) -> Result<(), Error> {
    let user = ctx
        .message()
        .reply_sender_id
        .ok_or(CommandError::ReplyRequired)?;

    let on = ctx.data().nonick.toggle_user(user).await?;
    info!("NoNick for user {}: {}", user, on);

    let text = {
        let l10n = ctx.l10n();
        let mut args = FluentArgs::new();
        args.set("state", state_label(&l10n, on));
        l10n.t("nonick-user-state", Some(&args))
    };
    ctx.say(text).await?;
    Ok(())
}

/// Toggle NoNick for the current chat
pub async fn nonickchat(ctx: Context<'_>) -> Result<(), Error> {
    let message = ctx.message();
    if message.is_private {
        return Err(CommandError::PrivateNotAllowed.into());
    }

    let on = ctx.data().nonick.toggle_chat(message.chat_id).await?;
    info!("NoNick for chat {}: {}", message.chat_id, on);

    let title = message
        .chat_title
        .clone()
        .unwrap_or_else(|| message.chat_id.to_string());
    ctx.say(target_state(&ctx.l10n(), &title, on)).await?;
    Ok(())
}

/// Toggle NoNick for a command
pub async fn nonickcmd(ctx: Context<'_>) -> Result<(), Error> {
    let command = ctx.message().args_raw();
    if command.is_empty() {
        return Err(CommandError::CommandNameRequired.into());
    }

    let data = ctx.data();
    if !data.registry.commands().iter().any(|c| c == command) {
        return Err(CommandError::CommandNotFound(command.to_string()).into());
    }

    let on = data.nonick.toggle_command(command).await?;
    info!("NoNick for command {}: {}", command, on);

    let prefix = data.prefix.get().await?;
    ctx.say(target_state(&ctx.l10n(), &format!("{}{}", prefix, command), on))
        .await?;
    Ok(())
}

/// List commands with NoNick enabled
pub async fn nonickcmds(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let prefix = escape_html(&data.prefix.get().await?);

    let lines = data
        .nonick
        .commands()
        .await?
        .iter()
        .map(|cmd| format!("▫️ <code>{}{}</code>", prefix, escape_html(cmd)))
        .collect();

    ctx.say(render_list(&ctx.l10n(), "nonick-commands-list", lines))
        .await?;
    Ok(())
}

/// List users with NoNick enabled
pub async fn nonickusers(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let mut lines = Vec::new();

    for id in data.nonick.users().await? {
        match data.messenger.get_entity(id).await {
            Ok(user) => lines.push(format!(
                "▫️ <b><a href=\"tg://user?id={}\">{}</a></b>",
                user.id,
                escape_html(&user.display_name)
            )),
            Err(e) => {
                warn!("User {} no longer resolves, removing from NoNick: {}", id, e);
                data.nonick.prune(NoNickList::Users, id).await?;
            }
        }
    }

    ctx.say(render_list(&ctx.l10n(), "nonick-users-list", lines))
        .await?;
    Ok(())
}

/// List chats with NoNick enabled
pub async fn nonickchats(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let mut lines = Vec::new();

    for id in data.nonick.chats().await? {
        match data.messenger.get_entity(id).await {
            Ok(chat) => lines.push(format!(
                "▫️ <b><a href=\"{}\">{}</a></b>",
                chat.url,
                escape_html(&chat.display_name)
            )),
            Err(e) => {
                warn!("Chat {} no longer resolves, removing from NoNick: {}", id, e);
                data.nonick.prune(NoNickList::Chats, id).await?;
            }
        }
    }

    ctx.say(render_list(&ctx.l10n(), "nonick-chats-list", lines))
        .await?;
    Ok(())
}
