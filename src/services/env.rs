use std::path::PathBuf;

pub const DEFAULT_LOCALE: &str = "en-US";

/// Process settings gathered from the environment (and `.env`, via dotenvy).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub config_path: PathBuf,
    pub locale: String,
    /// Running on lavHost, which serves the dashboard itself.
    pub hosted_web: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            config_path: PathBuf::from("config.json"),
            locale: DEFAULT_LOCALE.to_string(),
            hosted_web: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            config_path: lookup("USERBOT_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            locale: lookup("USERBOT_LANG")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.locale),
            hosted_web: lookup("LAVHOST").is_some(),
        }
    }
}
