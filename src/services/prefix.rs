use crate::Error;
use crate::services::kv::{KvStore, MAIN_NAMESPACE};
use std::sync::Arc;

pub const PREFIX_KEY: &str = "command_prefix";
pub const DEFAULT_PREFIX: &str = ".";

/// The command prefix. The userbot core owns and changes it, so every call
/// reads the store.
pub struct PrefixService {
    kv: Arc<dyn KvStore>,
}

impl PrefixService {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn get(&self) -> Result<String, Error> {
        self.kv
            .get_or(MAIN_NAMESPACE, PREFIX_KEY, DEFAULT_PREFIX.to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::kv::MemoryKvStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_follows_core_changes() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let prefix = PrefixService::new(kv.clone());

        assert_eq!(prefix.get().await.unwrap(), ".");

        kv.set(MAIN_NAMESPACE, PREFIX_KEY, json!("!")).await.unwrap();
        assert_eq!(prefix.get().await.unwrap(), "!");
    }
}
