use crate::Error;
use crate::services::host::{ChatId, UserId};
use crate::services::kv::{KvStore, MAIN_NAMESPACE};
use anyhow::bail;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// The three NoNick allowlists, each persisted under its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoNickList {
    Users,
    Chats,
    Commands,
}

impl NoNickList {
    pub fn key(&self) -> &'static str {
        match self {
            NoNickList::Users => "nonickusers",
            NoNickList::Chats => "nonickchats",
            NoNickList::Commands => "nonickcmds",
        }
    }
}

/// An element of a NoNick list, read back one item at a time.
trait ListItem: Ord + Serialize + Sized {
    fn from_stored(value: &Value) -> Option<Self>;
}

impl ListItem for i64 {
    // Older stores keep ids as strings
    fn from_stored(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl ListItem for String {
    fn from_stored(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

pub struct NoNickService {
    kv: Arc<dyn KvStore>,
}

impl NoNickService {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn users(&self) -> Result<BTreeSet<UserId>, Error> {
        self.load(NoNickList::Users).await
    }

    pub async fn chats(&self) -> Result<BTreeSet<ChatId>, Error> {
        self.load(NoNickList::Chats).await
    }

    pub async fn commands(&self) -> Result<BTreeSet<String>, Error> {
        self.load(NoNickList::Commands).await
    }

    /// Returns whether NoNick is now on for the user.
    pub async fn toggle_user(&self, user: UserId) -> Result<bool, Error> {
        self.toggle(NoNickList::Users, user).await
    }

    pub async fn toggle_chat(&self, chat: ChatId) -> Result<bool, Error> {
        self.toggle(NoNickList::Chats, chat).await
    }

    pub async fn toggle_command(&self, command: &str) -> Result<bool, Error> {
        self.toggle(NoNickList::Commands, command.to_string()).await
    }

    /// Drops an id that no longer resolves from a user or chat list.
    pub async fn prune(&self, list: NoNickList, id: i64) -> Result<(), Error> {
        let mut set: BTreeSet<i64> = self.load(list).await?;
        if set.remove(&id) {
            self.kv.set_value(MAIN_NAMESPACE, list.key(), &set).await?;
        }
        Ok(())
    }

    /// Unreadable items are skipped. A value that is not a list at all is an
    /// error, so it never gets overwritten by a toggle.
    async fn load<T: ListItem>(&self, list: NoNickList) -> Result<BTreeSet<T>, Error> {
        let Some(value) = self.kv.get(MAIN_NAMESPACE, list.key()).await? else {
            return Ok(BTreeSet::new());
        };
        let Value::Array(items) = &value else {
            bail!("Malformed value under {}/{}: {}", MAIN_NAMESPACE, list.key(), value);
        };

        let mut set = BTreeSet::new();
        for item in items {
            match T::from_stored(item) {
                Some(parsed) => {
                    set.insert(parsed);
                }
                None => warn!("Skipping unreadable item {} in {}", item, list.key()),
            }
        }
        Ok(set)
    }

    async fn toggle<T>(&self, list: NoNickList, item: T) -> Result<bool, Error>
    where
        T: ListItem + Send + Sync,
    {
        let mut set: BTreeSet<T> = self.load(list).await?;
        let enabled = if set.remove(&item) {
            false
        } else {
            set.insert(item);
            true
        };

        self.kv.set_value(MAIN_NAMESPACE, list.key(), &set).await?;
        Ok(enabled)
    }
}
