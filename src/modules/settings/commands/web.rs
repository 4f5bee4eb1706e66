use crate::modules::settings::callbacks::SettingsCallback;
use crate::services::host::{Button, Markup};
use crate::services::localization::{ContextL10nExt, L10nProxy};
use crate::services::web::requires_privacy_gate;
use crate::utils::escape_html;
use crate::{CallbackContext, Context, Error};
use fluent::FluentArgs;
use tracing::{info, warn};

fn wait_markup(l10n: &L10nProxy) -> Markup {
    vec![vec![Button::noop(l10n.t("web-wait", None))]]
}

fn link_markup(l10n: &L10nProxy, url: String) -> Markup {
    vec![vec![Button::url(l10n.t("web-btn", None), url)]]
}

fn privacy_text(l10n: &L10nProxy, key: &str, self_id: i64, prefix: Option<&str>) -> String {
    let mut args = FluentArgs::new();
    args.set("id", self_id.to_string());
    if let Some(prefix) = prefix {
        args.set("prefix", escape_html(prefix));
    }
    l10n.t(key, Some(&args))
}

/// Opens web tunnel to your Hikka web interface
pub async fn weburl(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let message = ctx.message();
    let l10n = ctx.l10n();

    if data.settings.hosted_web {
        let url = data.web.direct_url().await?;
        let text = format!(
            "{}\n\n{}",
            l10n.t("hosted-web", None),
            l10n.t("hosted-web-hint", None)
        );
        data.inline
            .form(message, &text, link_markup(&l10n, url))
            .await?;
        return Ok(());
    }

    if requires_privacy_gate(false, message.is_private, &message.text) {
        let self_id = data.messenger.self_id();
        let text = privacy_text(&l10n, "privacy-leak-nowarn", self_id, None);
        let markup = vec![vec![
            Button::callback(
                l10n.t("btn-open-anyway", None),
                SettingsCallback::WebForce.to_string(),
            ),
            Button::close(l10n.t("btn-close-warning", None)),
        ]];

        let shown = match data.inline.form(message, &text, markup).await {
            Ok(form) => form.is_some(),
            Err(e) => {
                warn!("Could not show privacy warning form: {:?}", e);
                false
            }
        };

        if !shown {
            let prefix = data.prefix.get().await?;
            let text = privacy_text(&l10n, "privacy-leak", self_id, Some(&prefix));
            ctx.say(text).await?;
        }
        return Ok(());
    }

    let form = data
        .inline
        .form(message, &l10n.t("opening-tunnel", None), wait_markup(&l10n))
        .await?;

    let url = data.web.tunnel_url().await?;
    info!("Web tunnel opened");

    match form {
        Some(form) => {
            data.inline
                .edit(form, &l10n.t("tunnel-opened", None), link_markup(&l10n, url))
                .await
        }
        None => {
            ctx.say(format!("{}\n\n{}", l10n.t("tunnel-opened", None), url))
                .await?;
            Ok(())
        }
    }
}

/// "Open anyway" on the privacy warning.
pub async fn open_tunnel(ctx: CallbackContext<'_>) -> Result<(), Error> {
    let l10n = ctx.l10n();
    ctx.edit(l10n.t("opening-tunnel", None), wait_markup(&l10n))
        .await?;

    let url = ctx.data().web.tunnel_url().await?;
    info!("Web tunnel opened");

    ctx.edit(l10n.t("tunnel-opened", None), link_markup(&l10n, url))
        .await
}
