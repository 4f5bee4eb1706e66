use crate::error::CommandError;
use crate::services::localization::{ContextL10nExt, L10nProxy};
use crate::services::watchers::{ChatToggle, WatcherFlags, WatcherRule};
use crate::utils::escape_html;
use crate::{Context, Error};
use fluent::FluentArgs;
use tracing::info;

fn name_args(name: &str) -> FluentArgs<'static> {
    let mut args = FluentArgs::new();
    args.set("name", escape_html(name));
    args
}

fn state_text(l10n: &L10nProxy, disabled: bool, name: &str) -> String {
    let key = if disabled {
        "watcher-disabled"
    } else {
        "watcher-enabled"
    };
    l10n.t(key, Some(&name_args(name)))
}

/// List every watcher and the rule suppressing it, if any
pub async fn watchers(ctx: Context<'_>) -> Result<(), Error> {
    let l10n = ctx.l10n();
    let (registered, disabled) = ctx.data().watchers.get_watchers().await?;

    let mut lines: Vec<String> = registered
        .iter()
        .filter(|name| !disabled.contains(name))
        .map(|name| format!("♻️ {}", escape_html(name)))
        .collect();
    lines.extend(
        disabled
            .iter()
            .map(|(name, rule)| format!("💢 {} {}", escape_html(name), rule)),
    );

    let text = if lines.is_empty() {
        l10n.t("nothing-to-show", None)
    } else {
        format!(
            "{}\n\n<b>{}</b>",
            l10n.t("watchers-header", None),
            lines.join("\n")
        )
    };
    ctx.say(text).await?;
    Ok(())
}

/// Toggle a watcher in the current chat
pub async fn watcherbl(ctx: Context<'_>) -> Result<(), Error> {
    let args = ctx.message().args_raw();
    if args.is_empty() {
        return Err(CommandError::WatcherNameRequired.into());
    }

    let service = &ctx.data().watchers;
    let name = service
        .resolve(args)
        .ok_or_else(|| CommandError::WatcherNotFound(args.to_string()))?;

    let (_, mut disabled) = service.get_watchers().await?;
    let chat_id = ctx.message().chat_id;
    let toggle = disabled.toggle_chat(&name, chat_id);
    service.save(&disabled).await?;

    info!("Watcher {} {:?} in chat {}", name, toggle, chat_id);

    let l10n = ctx.l10n();
    ctx.say(format!(
        "{} {}",
        state_text(&l10n, toggle == ChatToggle::Disabled, &name),
        l10n.t("watcher-in-current-chat", None)
    ))
    .await?;
    Ok(())
}

/// Toggle a watcher globally, or restrict where it runs with -c, -p, -o, -i
pub async fn watchercmd(ctx: Context<'_>) -> Result<(), Error> {
    let (flags, args) = WatcherFlags::parse(ctx.message().args_raw());
    if args.is_empty() {
        return Err(CommandError::WatcherNameRequired.into());
    }

    let service = &ctx.data().watchers;
    let name = service
        .resolve(&args)
        .ok_or(CommandError::WatcherNotFound(args))?;

    let (_, mut disabled) = service.get_watchers().await?;
    let l10n = ctx.l10n();

    let text = if !flags.is_empty() {
        let symbols = disabled.apply_scope(&name, flags);
        service.save(&disabled).await?;
        info!("Watcher {} restricted to {:?}", name, symbols);

        format!(
            "{} (<code>{}</code>)",
            state_text(&l10n, false, &name),
            WatcherRule::Scope(symbols)
        )
    } else {
        let now_disabled = disabled.toggle_everywhere(&name);
        service.save(&disabled).await?;
        info!("Watcher {} disabled everywhere: {}", name, now_disabled);

        state_text(&l10n, now_disabled, &name)
    };

    ctx.say(text).await?;
    Ok(())
}
