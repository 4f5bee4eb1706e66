use crate::modules::settings::callbacks::SettingsCallback;
use crate::services::flags::FeatureFlag;
use crate::services::host::{Button, Markup};
use crate::services::localization::{ContextL10nExt, L10nProxy};
use crate::services::prefix::DEFAULT_PREFIX;
use crate::{CallbackContext, Context, Error};
use std::collections::HashMap;
use tracing::info;

/// Flags per row of the menu, top to bottom.
const FLAG_ROWS: [&[FeatureFlag]; 6] = [
    &[
        FeatureFlag::NoNickname,
        FeatureFlag::Grep,
        FeatureFlag::InlineLogs,
    ],
    &[FeatureFlag::DisableModulesFs],
    &[FeatureFlag::PermanentModulesFs],
    &[FeatureFlag::SuggestSubscribe],
    &[FeatureFlag::DisableCustomEmojis],
    &[FeatureFlag::Debugger],
];

pub fn build_ui(values: &HashMap<FeatureFlag, bool>, l10n: &L10nProxy) -> Markup {
    let mut rows: Markup = FLAG_ROWS
        .iter()
        .map(|row| {
            row.iter()
                .map(|flag| {
                    let current = values
                        .get(flag)
                        .copied()
                        .unwrap_or_else(|| flag.default_value());
                    Button::callback(
                        l10n.t(flag.label_key(current), None),
                        SettingsCallback::Toggle {
                            flag: *flag,
                            value: !current,
                        }
                        .to_string(),
                    )
                })
                .collect()
        })
        .collect();

    rows.push(vec![
        Button::callback(
            l10n.t("btn-restart", None),
            SettingsCallback::ConfirmRestart.to_string(),
        ),
        Button::callback(
            l10n.t("btn-update", None),
            SettingsCallback::ConfirmUpdate.to_string(),
        ),
    ]);
    rows.push(vec![Button::close(l10n.t("close-menu", None))]);

    rows
}

async fn current_ui(data: &crate::Data, l10n: &L10nProxy) -> Result<Markup, Error> {
    let values: HashMap<FeatureFlag, bool> = data.flags.snapshot().await?.into_iter().collect();
    Ok(build_ui(&values, l10n))
}

/// Show settings menu
pub async fn settings(ctx: Context<'_>) -> Result<(), Error> {
    let l10n = ctx.l10n();
    let markup = current_ui(ctx.data(), &l10n).await?;

    ctx.data()
        .inline
        .form(ctx.message(), &l10n.t("settings-header", None), markup)
        .await?;
    Ok(())
}

pub async fn handle_toggle(
    ctx: CallbackContext<'_>,
    flag: FeatureFlag,
    value: bool,
) -> Result<(), Error> {
    let data = ctx.data();
    data.flags.set(flag, value).await?;

    if flag == FeatureFlag::DisableCustomEmojis {
        data.runtime.set_custom_emojis(!value);
    }

    let l10n = ctx.l10n();
    if flag == FeatureFlag::NoNickname && value && data.prefix.get().await? == DEFAULT_PREFIX {
        ctx.answer(l10n.t("nonick-warning", None), true).await?;
    } else {
        ctx.answer(l10n.t("settings-saved", None), false).await?;
    }

    ctx.edit(l10n.t("settings-header", None), current_ui(data, &l10n).await?)
        .await
}

async fn confirm_screen(
    ctx: CallbackContext<'_>,
    text_key: &str,
    button_key: &str,
    callback: SettingsCallback,
) -> Result<(), Error> {
    let l10n = ctx.l10n();
    ctx.edit(
        l10n.t(text_key, None),
        vec![vec![
            Button::callback(l10n.t(button_key, None), callback.to_string()),
            Button::close(l10n.t("btn-cancel", None)),
        ]],
    )
    .await
}

pub async fn confirm_restart(ctx: CallbackContext<'_>) -> Result<(), Error> {
    confirm_screen(
        ctx,
        "confirm-restart",
        "btn-confirm-restart",
        SettingsCallback::Restart,
    )
    .await
}

pub async fn confirm_update(ctx: CallbackContext<'_>) -> Result<(), Error> {
    confirm_screen(
        ctx,
        "confirm-update",
        "btn-confirm-update",
        SettingsCallback::Update,
    )
    .await
}

async fn run_host_command(
    ctx: CallbackContext<'_>,
    started_key: &str,
    command: &str,
) -> Result<(), Error> {
    ctx.answer(ctx.l10n().t(started_key, None), true).await?;
    ctx.delete().await?;

    info!("Running host command {} from settings menu", command);
    ctx.data().registry.invoke_command(command, "-f").await
}

pub async fn restart(ctx: CallbackContext<'_>) -> Result<(), Error> {
    run_host_command(ctx, "restart-started", "restart").await
}

pub async fn update(ctx: CallbackContext<'_>) -> Result<(), Error> {
    run_host_command(ctx, "update-started", "update").await
}
