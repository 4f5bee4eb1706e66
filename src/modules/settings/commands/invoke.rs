use crate::services::invoke::InvokeTarget;
use crate::services::localization::ContextL10nExt;
use crate::utils::escape_html;
use crate::{Context, Error};
use fluent::FluentArgs;
use tracing::info;

/// <module or `core` for built-in methods> <method> - Only for debugging purposes
pub async fn invokecmd(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let target = InvokeTarget::resolve(ctx.message().args_raw(), data.registry.as_ref())?;

    let invoking = {
        let mut args = FluentArgs::new();
        args.set("method", escape_html(target.method()));
        args.set("module", escape_html(target.module()));
        ctx.l10n().t("invoking", Some(&args))
    };
    ctx.say(invoking).await?;

    info!("Invoking debug method {} of {}", target.method(), target.module());
    let result = target
        .run(data.messenger.as_ref(), data.registry.as_ref(), ctx.message())
        .await?;

    let text = {
        let l10n = ctx.l10n();
        let mut args = FluentArgs::new();
        args.set("method", escape_html(target.method()));
        format!(
            "{}\n\n{}\n<code>{}</code>",
            l10n.t("invoke-result", Some(&args)),
            l10n.t("invoke-result-label", None),
            escape_html(&result)
        )
    };
    ctx.say(text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::modules::settings::handle_message;
    use crate::services::host::{CacheKind, Messenger};
    use crate::testing::TestEnv;

    async fn run(env: &TestEnv, text: &str) -> Vec<String> {
        let msg = env.private_message(text);
        assert!(handle_message(&env.data, &msg).await.unwrap());
        env.messenger.answers()
    }

    #[tokio::test]
    async fn test_argument_errors() {
        let env = TestEnv::new();

        let answers = run(&env, ".invokecmd core").await;
        assert!(answers[0].contains("No arguments specified"));

        let answers = run(&env, ".invokecmd Nope dump").await;
        assert!(answers[1].contains("<code>Nope</code> <b>not found</b>"));

        let answers = run(&env, ".invokecmd core drop_db").await;
        assert!(answers[2].contains("<code>drop_db</code> <b>not found, ergo can't be invoked"));
        assert_eq!(answers.len(), 3);
    }

    #[tokio::test]
    async fn test_module_method_result_is_escaped() {
        let env = TestEnv::new();

        let answers = run(&env, ".invokecmd Tester dump_state").await;
        assert_eq!(answers.len(), 2);
        assert!(answers[0].contains("<code>dump_state</code> <b>of</b> <code>Tester</code>"));
        assert!(answers[1].contains("<code>&lt;state ok&gt;</code>"));
        assert!(env.journal.contains("invoke Tester dump_state"));
    }

    #[tokio::test]
    async fn test_core_invoke() {
        let env = TestEnv::new();
        env.messenger.fill_cache(CacheKind::Perms, 5);

        let answers = run(&env, ".invokecmd core clear_perms_cache").await;
        assert!(answers[1].contains("Dropped 5 cache records"));
        assert_eq!(env.messenger.cache_len(CacheKind::Perms), 0);
    }
}
