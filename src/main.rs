use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing::info;
use userbot_settings::db;
use userbot_settings::modules;
use userbot_settings::services::config_file::GlobalConfig;
use userbot_settings::services::env::Settings;
use userbot_settings::services::flags::{FeatureFlag, FlagService};
use userbot_settings::services::kv::{DbKvStore, KvStore, MAIN_NAMESPACE};
use userbot_settings::services::localization::LocalizationManager;
use userbot_settings::services::log_control::{LogControl, init_tracing};
use userbot_settings::services::nonick::NoNickService;
use userbot_settings::services::watchers::{DISABLED_WATCHERS_KEY, DisabledWatchers};

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rollback the specified number of migrations and run all migrations again.
    #[arg(long, num_args = 0..=1, default_missing_value = "1")]
    refresh_migrations: Option<u32>,

    /// Only log errors.
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the watcher suppression rules
    Watchers,
    /// Print the NoNick users, chats and commands
    Nonick,
    /// Print every feature flag with its effective value
    Flags,
    /// Store a feature flag
    SetFlag {
        flag: FeatureFlag,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Print the module's commands with their localized descriptions
    Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let log_control = init_tracing();
    if args.quiet {
        log_control.silence();
    }

    let settings = Settings::from_env();

    if let Some(Command::Commands) = args.command {
        print_commands(&settings);
        return Ok(());
    }

    // Establish database connection
    let database_url = settings
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;
    let conn = db::establish_connection(database_url)
        .await
        .context("Failed to connect to database")?;

    // Run migrations
    if let Some(depth) = args.refresh_migrations {
        info!("Refreshing migrations (down {}, then up)...", depth);
        db::migrations::Migrator::down(&conn, Some(depth))
            .await
            .context("Failed to rollback migration")?;
    }

    db::migrations::Migrator::up(&conn, None)
        .await
        .context("Failed to run migrations")?;

    if args.refresh_migrations.is_some() {
        info!("Migrations refreshed successfully.");
        return Ok(());
    }

    let kv: Arc<dyn KvStore> = Arc::new(DbKvStore::new(conn));
    let config = Arc::new(GlobalConfig::new(&settings.config_path));

    match args.command {
        Some(Command::Watchers) => {
            let disabled: DisabledWatchers = kv
                .get_parsed(MAIN_NAMESPACE, DISABLED_WATCHERS_KEY)
                .await?
                .unwrap_or_default();
            if disabled.is_empty() {
                println!("No watcher is suppressed");
            }
            for (name, rule) in disabled.iter() {
                println!("{} {}", name, rule);
            }
        }
        Some(Command::Nonick) => {
            let nonick = NoNickService::new(kv);
            println!("users: {:?}", nonick.users().await?);
            println!("chats: {:?}", nonick.chats().await?);
            println!("commands: {:?}", nonick.commands().await?);
        }
        Some(Command::Flags) => {
            let flags = FlagService::new(kv, config);
            for (flag, value) in flags.snapshot().await? {
                println!("{} = {}", flag, value);
            }
        }
        Some(Command::SetFlag { flag, value }) => {
            let flags = FlagService::new(kv, config);
            flags.set(flag, value).await?;
            println!("{} = {}", flag, value);
        }
        Some(Command::Commands) => print_commands(&settings),
        None => info!("Store is ready, nothing else to do"),
    }

    Ok(())
}

fn print_commands(settings: &Settings) {
    let l10n = LocalizationManager::new();

    for module in modules::get_modules() {
        println!(
            "[{}] {} - {}",
            module.definition.id,
            l10n.translate(&settings.locale, module.definition.name_key, None),
            l10n.translate(&settings.locale, module.definition.description_key, None)
        );
        for command in module.commands {
            let desc = l10n
                .command_locale(&settings.locale, command)
                .and_then(|c| c.desc.clone())
                .unwrap_or_default();
            println!("  {:<16} {}", command, desc);
        }
    }
}
