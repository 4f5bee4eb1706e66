use crate::modules::settings::callbacks::SettingsCallback;
use crate::services::host::Button;
use crate::services::localization::ContextL10nExt;
use crate::services::uninstall::{UninstallStep, confirmation_rows};
use crate::{CallbackContext, Context, Error};
use tracing::{debug, info};

/// Uninstall the userbot from this account
pub async fn uninstall_hikka(ctx: Context<'_>) -> Result<(), Error> {
    let l10n = ctx.l10n();
    let text = format!(
        "{}\n\n{}",
        l10n.t("deauth-confirm", None),
        l10n.t("deauth-consequences", None)
    );
    let markup = vec![vec![
        Button::callback(
            l10n.t("deauth-confirm-btn", None),
            SettingsCallback::UninstallStep2.to_string(),
        ),
        Button::callback(
            l10n.t("deauth-cancel", None),
            SettingsCallback::UninstallCancel.to_string(),
        ),
    ]];

    let data = ctx.data();
    if let Some(form) = data.inline.form(ctx.message(), &text, markup).await? {
        data.uninstall.begin(form, ctx.message().sender_id);
    }
    Ok(())
}

pub async fn second_step(ctx: CallbackContext<'_>) -> Result<(), Error> {
    let data = ctx.data();
    if !data.uninstall.advance(
        ctx.form(),
        ctx.call().from,
        UninstallStep::ConfirmFirst,
        UninstallStep::ConfirmSecond,
    ) {
        debug!("Ignoring out of order uninstall step on {:?}", ctx.form());
        return Ok(());
    }

    let l10n = ctx.l10n();
    let cancel = SettingsCallback::UninstallCancel.to_string();
    let mut options = vec![Button::callback(
        l10n.t("deauth-yes", None),
        SettingsCallback::UninstallConfirm.to_string(),
    )];
    options.extend(
        ["deauth-no-1", "deauth-no-2", "deauth-no-3"]
            .into_iter()
            .map(|key| Button::callback(l10n.t(key, None), cancel.clone())),
    );

    let markup = {
        let mut rng = rand::thread_rng();
        confirmation_rows(
            options,
            Button::callback(l10n.t("deauth-cancel", None), cancel),
            2,
            &mut rng,
        )
    };

    ctx.edit(l10n.t("deauth-confirm-step2", None), markup).await
}

pub async fn confirm(ctx: CallbackContext<'_>) -> Result<(), Error> {
    let data = ctx.data();
    if !data.uninstall.advance(
        ctx.form(),
        ctx.call().from,
        UninstallStep::ConfirmSecond,
        UninstallStep::Executing,
    ) {
        debug!("Ignoring out of order uninstall confirmation on {:?}", ctx.form());
        return Ok(());
    }

    ctx.edit(ctx.l10n().t("uninstalling", None), vec![]).await?;

    let report = data.uninstaller.run().await;
    data.uninstall.cancel(ctx.form());
    info!("Uninstall finished: {:?}", report);
    Ok(())
}

pub async fn cancel(ctx: CallbackContext<'_>) -> Result<(), Error> {
    if ctx.data().uninstall.cancel(ctx.form()) {
        debug!("Uninstall cancelled on {:?}", ctx.form());
    }
    ctx.delete().await
}
