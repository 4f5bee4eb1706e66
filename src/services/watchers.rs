use crate::Error;
use crate::services::host::{ChatId, ModuleRegistry};
use crate::services::kv::{KvStore, MAIN_NAMESPACE};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::warn;

pub const DISABLED_WATCHERS_KEY: &str = "disabled_watchers";

const EVERYWHERE_SYMBOL: &str = "*";

static FLAG_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-([cpoi])$").expect("Invalid watcher flag regex"));

/// Global restriction of where a watcher may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeFlag {
    OnlyChats,
    OnlyPm,
    Out,
    In,
}

impl ScopeFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeFlag::OnlyChats => "only_chats",
            ScopeFlag::OnlyPm => "only_pm",
            ScopeFlag::Out => "out",
            ScopeFlag::In => "in",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "only_chats" => Some(ScopeFlag::OnlyChats),
            "only_pm" => Some(ScopeFlag::OnlyPm),
            "out" => Some(ScopeFlag::Out),
            "in" => Some(ScopeFlag::In),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherRule {
    /// Stored as `["*"]`.
    Everywhere,
    /// Disabled only in these chats.
    Chats(Vec<ChatId>),
    Scope(Vec<ScopeFlag>),
}

impl WatcherRule {
    fn is_empty(&self) -> bool {
        match self {
            WatcherRule::Everywhere => false,
            WatcherRule::Chats(chats) => chats.is_empty(),
            WatcherRule::Scope(flags) => flags.is_empty(),
        }
    }

    fn to_items(&self) -> Vec<StoredItem> {
        match self {
            WatcherRule::Everywhere => vec![StoredItem::Symbol(EVERYWHERE_SYMBOL.to_string())],
            WatcherRule::Chats(chats) => chats.iter().copied().map(StoredItem::Chat).collect(),
            WatcherRule::Scope(flags) => flags
                .iter()
                .map(|f| StoredItem::Symbol(f.as_str().to_string()))
                .collect(),
        }
    }

    fn from_items(name: &str, items: Vec<StoredItem>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }

        let mut chats = Vec::new();
        let mut flags = Vec::new();
        for item in items {
            match item {
                StoredItem::Symbol(s) if s == EVERYWHERE_SYMBOL => {
                    return Some(WatcherRule::Everywhere);
                }
                StoredItem::Symbol(s) => match ScopeFlag::from_symbol(&s) {
                    Some(flag) if !flags.contains(&flag) => flags.push(flag),
                    Some(_) => {}
                    None => warn!("Unknown symbol {:?} in rule of watcher {}", s, name),
                },
                StoredItem::Chat(id) if !chats.contains(&id) => chats.push(id),
                StoredItem::Chat(_) => {}
            }
        }

        // Chat lists and scope flags never mix, chats win on legacy data
        if !chats.is_empty() {
            Some(WatcherRule::Chats(chats))
        } else if !flags.is_empty() {
            Some(WatcherRule::Scope(flags))
        } else {
            None
        }
    }
}

impl fmt::Display for WatcherRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self
            .to_items()
            .into_iter()
            .map(|item| match item {
                StoredItem::Chat(id) => id.to_string(),
                StoredItem::Symbol(s) => format!("'{}'", s),
            })
            .collect();
        write!(f, "[{}]", items.join(", "))
    }
}

/// One element of a persisted rule list: a chat id or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StoredItem {
    Chat(i64),
    Symbol(String),
}

impl StoredItem {
    fn from_value(name: &str, value: &Value) -> Option<Self> {
        let item = match value {
            Value::Number(n) => n.as_i64().map(StoredItem::Chat),
            Value::String(s) => Some(match s.parse() {
                Ok(id) => StoredItem::Chat(id),
                Err(_) => StoredItem::Symbol(s.clone()),
            }),
            _ => None,
        };
        if item.is_none() {
            warn!("Skipping unreadable item {} in rule of watcher {}", value, name);
        }
        item
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatToggle {
    Disabled,
    Enabled,
}

/// What the dispatcher knows about an event when asking [`DisabledWatchers::allows`].
#[derive(Debug, Clone, Copy)]
pub struct WatcherEvent {
    pub chat_id: ChatId,
    pub is_private: bool,
    pub outgoing: bool,
}

/// The `disabled_watchers` mapping.
///
/// Names compare case-insensitively; the casing of the last write is kept
/// for storage and display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, Vec<StoredItem>>"
)]
pub struct DisabledWatchers {
    entries: BTreeMap<String, (String, WatcherRule)>,
}

impl From<BTreeMap<String, Value>> for DisabledWatchers {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut watchers = Self::default();
        for (name, value) in raw {
            let Value::Array(values) = &value else {
                warn!("Skipping malformed rule of watcher {}: {}", name, value);
                continue;
            };
            let items = values
                .iter()
                .filter_map(|v| StoredItem::from_value(&name, v))
                .collect();
            if let Some(rule) = WatcherRule::from_items(&name, items) {
                watchers.set(&name, rule);
            }
        }
        watchers
    }
}

impl From<DisabledWatchers> for BTreeMap<String, Vec<StoredItem>> {
    fn from(watchers: DisabledWatchers) -> Self {
        watchers
            .entries
            .into_values()
            .map(|(name, rule)| {
                let items = rule.to_items();
                (name, items)
            })
            .collect()
    }
}

impl DisabledWatchers {
    pub fn get(&self, name: &str) -> Option<&WatcherRule> {
        self.entries.get(&name.to_lowercase()).map(|(_, rule)| rule)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries as (display name, rule), ordered by normalized name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WatcherRule)> {
        self.entries
            .values()
            .map(|(name, rule)| (name.as_str(), rule))
    }

    /// Stores `rule` for `name`. Empty rules are removed instead.
    pub fn set(&mut self, name: &str, rule: WatcherRule) {
        let key = name.to_lowercase();
        if rule.is_empty() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, (name.to_string(), rule));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<WatcherRule> {
        self.entries
            .remove(&name.to_lowercase())
            .map(|(_, rule)| rule)
    }

    /// Disables the watcher in `chat`, or re-enables it if it already was.
    ///
    /// A scope or global rule is replaced by a chat list holding `chat` only.
    pub fn toggle_chat(&mut self, name: &str, chat: ChatId) -> ChatToggle {
        let mut chats = match self.get(name) {
            Some(WatcherRule::Chats(chats)) => chats.clone(),
            _ => Vec::new(),
        };

        let result = if let Some(pos) = chats.iter().position(|c| *c == chat) {
            chats.remove(pos);
            ChatToggle::Enabled
        } else {
            chats.push(chat);
            ChatToggle::Disabled
        };

        self.set(name, WatcherRule::Chats(chats));
        result
    }

    /// Replaces whatever rule the watcher had with `flags`.
    pub fn apply_scope(&mut self, name: &str, flags: WatcherFlags) -> Vec<ScopeFlag> {
        let symbols = flags.symbols();
        self.set(name, WatcherRule::Scope(symbols.clone()));
        symbols
    }

    /// Flips between disabled everywhere and no rule at all. Returns whether
    /// the watcher is now disabled everywhere.
    pub fn toggle_everywhere(&mut self, name: &str) -> bool {
        if self.get(name) == Some(&WatcherRule::Everywhere) {
            self.remove(name);
            false
        } else {
            self.set(name, WatcherRule::Everywhere);
            true
        }
    }

    /// Whether the watcher `name` should see `event`.
    pub fn allows(&self, name: &str, event: &WatcherEvent) -> bool {
        match self.get(name) {
            None => true,
            Some(WatcherRule::Everywhere) => false,
            Some(WatcherRule::Chats(chats)) => !chats.contains(&event.chat_id),
            Some(WatcherRule::Scope(flags)) => flags.iter().all(|flag| match flag {
                ScopeFlag::OnlyChats => !event.is_private,
                ScopeFlag::OnlyPm => event.is_private,
                ScopeFlag::Out => event.outgoing,
                ScopeFlag::In => !event.outgoing,
            }),
        }
    }
}

/// Flags of `watchercmd`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherFlags {
    pub only_chats: bool,
    pub only_pm: bool,
    pub outgoing: bool,
    pub incoming: bool,
}

impl WatcherFlags {
    /// Splits `args` into flags and the remaining watcher name.
    ///
    /// `-c` wins over `-p` and `-o` wins over `-i` when both are given.
    pub fn parse(args: &str) -> (Self, String) {
        let mut flags = Self::default();
        let mut rest = Vec::new();

        for token in args.split_whitespace() {
            let Some(caps) = FLAG_TOKEN.captures(token) else {
                rest.push(token);
                continue;
            };
            match &caps[1] {
                "c" => flags.only_chats = true,
                "p" => flags.only_pm = true,
                "o" => flags.outgoing = true,
                _ => flags.incoming = true,
            }
        }

        if flags.only_chats && flags.only_pm {
            flags.only_pm = false;
        }
        if flags.outgoing && flags.incoming {
            flags.incoming = false;
        }

        (flags, rest.join(" "))
    }

    pub fn is_empty(&self) -> bool {
        !(self.only_chats || self.only_pm || self.outgoing || self.incoming)
    }

    pub fn symbols(&self) -> Vec<ScopeFlag> {
        [
            (self.only_chats, ScopeFlag::OnlyChats),
            (self.only_pm, ScopeFlag::OnlyPm),
            (self.outgoing, ScopeFlag::Out),
            (self.incoming, ScopeFlag::In),
        ]
        .into_iter()
        .filter_map(|(set, flag)| set.then_some(flag))
        .collect()
    }
}

pub struct WatcherService {
    kv: Arc<dyn KvStore>,
    registry: Arc<dyn ModuleRegistry>,
}

impl WatcherService {
    pub fn new(kv: Arc<dyn KvStore>, registry: Arc<dyn ModuleRegistry>) -> Self {
        Self { kv, registry }
    }

    /// Registered watcher names (live from the registry) and the persisted
    /// suppression mapping.
    pub async fn get_watchers(&self) -> Result<(Vec<String>, DisabledWatchers), Error> {
        let disabled = self
            .kv
            .get_parsed(MAIN_NAMESPACE, DISABLED_WATCHERS_KEY)
            .await?
            .unwrap_or_default();
        Ok((self.registry.watchers(), disabled))
    }

    pub async fn save(&self, watchers: &DisabledWatchers) -> Result<(), Error> {
        self.kv
            .set_value(MAIN_NAMESPACE, DISABLED_WATCHERS_KEY, watchers)
            .await
    }

    /// Matches `name` against the registry, returning the registry's casing.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let wanted = name.to_lowercase();
        self.registry
            .watchers()
            .into_iter()
            .find(|w| w.to_lowercase() == wanted)
    }
}
