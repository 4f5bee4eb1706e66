use crate::Error;
use crate::services::config_file::GlobalConfig;
use crate::services::kv::{KvStore, LOG_NAMESPACE, MAIN_NAMESPACE};
use anyhow::anyhow;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagStorage {
    Namespace(&'static str),
    /// The on-disk config shared by every account.
    GlobalConfig,
}

/// Boolean settings toggled from the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureFlag {
    NoNickname,
    Grep,
    InlineLogs,
    DisableModulesFs,
    PermanentModulesFs,
    SuggestSubscribe,
    DisableCustomEmojis,
    Debugger,
}

impl FeatureFlag {
    pub const ALL: [FeatureFlag; 8] = [
        FeatureFlag::NoNickname,
        FeatureFlag::Grep,
        FeatureFlag::InlineLogs,
        FeatureFlag::DisableModulesFs,
        FeatureFlag::PermanentModulesFs,
        FeatureFlag::SuggestSubscribe,
        FeatureFlag::DisableCustomEmojis,
        FeatureFlag::Debugger,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FeatureFlag::NoNickname => "no_nickname",
            FeatureFlag::Grep => "grep",
            FeatureFlag::InlineLogs => "inlinelogs",
            FeatureFlag::DisableModulesFs => "disable_modules_fs",
            FeatureFlag::PermanentModulesFs => "permanent_modules_fs",
            FeatureFlag::SuggestSubscribe => "suggest_subscribe",
            FeatureFlag::DisableCustomEmojis => "disable_custom_emojis",
            FeatureFlag::Debugger => "debugger",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn default_value(&self) -> bool {
        matches!(self, FeatureFlag::InlineLogs | FeatureFlag::SuggestSubscribe)
    }

    pub fn storage(&self) -> FlagStorage {
        match self {
            FeatureFlag::DisableCustomEmojis => FlagStorage::GlobalConfig,
            FeatureFlag::Debugger => FlagStorage::Namespace(LOG_NAMESPACE),
            _ => FlagStorage::Namespace(MAIN_NAMESPACE),
        }
    }

    /// Fluent key of the menu button showing the flag at `current`.
    pub fn label_key(&self, current: bool) -> &'static str {
        match (self, current) {
            (FeatureFlag::NoNickname, true) => "flag-nonick-on",
            (FeatureFlag::NoNickname, false) => "flag-nonick-off",
            (FeatureFlag::Grep, true) => "flag-grep-on",
            (FeatureFlag::Grep, false) => "flag-grep-off",
            (FeatureFlag::InlineLogs, true) => "flag-inlinelogs-on",
            (FeatureFlag::InlineLogs, false) => "flag-inlinelogs-off",
            (FeatureFlag::DisableModulesFs, true) => "do-not-suggest-fs",
            (FeatureFlag::DisableModulesFs, false) => "suggest-fs",
            (FeatureFlag::PermanentModulesFs, true) => "use-fs",
            (FeatureFlag::PermanentModulesFs, false) => "do-not-use-fs",
            (FeatureFlag::SuggestSubscribe, true) => "suggest-subscribe",
            (FeatureFlag::SuggestSubscribe, false) => "do-not-suggest-subscribe",
            (FeatureFlag::DisableCustomEmojis, true) => "no-custom-emojis",
            (FeatureFlag::DisableCustomEmojis, false) => "custom-emojis",
            (FeatureFlag::Debugger, true) => "debugger-enabled",
            (FeatureFlag::Debugger, false) => "debugger-disabled",
        }
    }
}

impl fmt::Display for FeatureFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FeatureFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| anyhow!("Unknown feature flag: {}", s))
    }
}

pub struct FlagService {
    kv: Arc<dyn KvStore>,
    config: Arc<GlobalConfig>,
}

impl FlagService {
    pub fn new(kv: Arc<dyn KvStore>, config: Arc<GlobalConfig>) -> Self {
        Self { kv, config }
    }

    pub async fn get(&self, flag: FeatureFlag) -> Result<bool, Error> {
        match flag.storage() {
            FlagStorage::Namespace(ns) => self.kv.get_or(ns, flag.key(), flag.default_value()).await,
            FlagStorage::GlobalConfig => self.config.get_bool(flag.key(), flag.default_value()),
        }
    }

    pub async fn set(&self, flag: FeatureFlag, value: bool) -> Result<(), Error> {
        match flag.storage() {
            FlagStorage::Namespace(ns) => self.kv.set_value(ns, flag.key(), &value).await?,
            FlagStorage::GlobalConfig => self.config.save_key(flag.key(), Value::Bool(value))?,
        }

        info!("Feature flag {} set to {}", flag, value);
        Ok(())
    }

    /// Effective value of every flag, in menu order.
    pub async fn snapshot(&self) -> Result<Vec<(FeatureFlag, bool)>, Error> {
        let mut values = Vec::with_capacity(FeatureFlag::ALL.len());
        for flag in FeatureFlag::ALL {
            values.push((flag, self.get(flag).await?));
        }
        Ok(values)
    }
}
