use crate::Error;
use crate::db::entities::kv_entries;
use anyhow::Context as _;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Namespace of the userbot core. Most settings live here.
pub const MAIN_NAMESPACE: &str = "hikka.main";
/// Namespace of the logging subsystem.
pub const LOG_NAMESPACE: &str = "hikka.log";

/// Namespaced JSON key-value storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error>;

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), Error>;
}

impl dyn KvStore {
    /// Reads and deserializes a scalar. Missing or malformed values yield `default`.
    pub async fn get_or<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
        default: T,
    ) -> Result<T, Error> {
        let Some(value) = self.get(namespace, key).await? else {
            return Ok(default);
        };

        match serde_json::from_value(value) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(
                    "Malformed value under {}/{}, falling back to default: {}",
                    namespace, key, e
                );
                Ok(default)
            }
        }
    }

    /// Reads and deserializes a value, failing on malformed data so that
    /// callers never write back over something they could not read.
    pub async fn get_parsed<T: DeserializeOwned>(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<T>, Error> {
        let Some(value) = self.get(namespace, key).await? else {
            return Ok(None);
        };

        let parsed = serde_json::from_value(value)
            .with_context(|| format!("Malformed value under {}/{}", namespace, key))?;
        Ok(Some(parsed))
    }

    pub async fn set_value<T: Serialize + ?Sized>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
    ) -> Result<(), Error> {
        self.set(namespace, key, serde_json::to_value(value)?).await
    }
}

pub struct DbKvStore {
    db: DatabaseConnection,
}

impl DbKvStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KvStore for DbKvStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error> {
        let entry = kv_entries::Entity::find_by_id((namespace.to_owned(), key.to_owned()))
            .one(&self.db)
            .await?;

        Ok(entry.map(|e| e.value))
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), Error> {
        let entry = kv_entries::ActiveModel {
            namespace: Set(namespace.to_owned()),
            key: Set(key.to_owned()),
            value: Set(value),
            updated_at: Set(Utc::now()),
        };

        kv_entries::Entity::insert(entry)
            .on_conflict(
                OnConflict::columns([kv_entries::Column::Namespace, kv_entries::Column::Key])
                    .update_columns([kv_entries::Column::Value, kv_entries::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }
}

/// Process-local store, for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: DashMap<(String, String), Value>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error> {
        Ok(self
            .entries
            .get(&(namespace.to_owned(), key.to_owned()))
            .map(|v| v.clone()))
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), Error> {
        self.entries
            .insert((namespace.to_owned(), key.to_owned()), value);
        Ok(())
    }
}
