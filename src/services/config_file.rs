use crate::Error;
use anyhow::Context as _;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// The userbot's on-disk JSON config, shared by every account on the host.
///
/// Read on every access, like the host does, so edits made by other
/// processes are picked up without a restart.
pub struct GlobalConfig {
    path: PathBuf,
}

impl GlobalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_key(&self, key: &str) -> Result<Option<Value>, Error> {
        Ok(self.load()?.remove(key))
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, Error> {
        Ok(self
            .get_key(key)?
            .and_then(|v| v.as_bool())
            .unwrap_or(default))
    }

    pub fn save_key(&self, key: &str, value: Value) -> Result<(), Error> {
        let mut config = self.load()?;
        config.insert(key.to_owned(), value);

        let content = serde_json::to_string_pretty(&config)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config {}", self.path.display()))
    }

    fn load(&self) -> Result<Map<String, Value>, Error> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Malformed config {}", self.path.display()))
    }
}
