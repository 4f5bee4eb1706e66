//! In-memory fakes of the host seams, shared by the unit tests.

use crate::services::config_file::GlobalConfig;
use crate::services::env::Settings;
use crate::services::host::{
    Button, CacheKind, CallbackQuery, ChannelJoinRequest, ConversationTurn, Dashboard, Dialog,
    DialogFolder, Entity, Host, IncomingMessage, InlineUi, Markup, MessageRef, Messenger,
    ModuleCounts, ModuleRegistry, Runtime, UserId,
};
use crate::services::kv::{KvStore, MemoryKvStore};
use crate::services::log_control::LogControl;
use crate::{Data, Error};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SELF_ID: UserId = 1000;
pub const BOT_ID: UserId = 777;
pub const BOT_USERNAME: &str = "hikka_test_bot";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A config path unique to this test run.
pub fn temp_config_path() -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "userbot-settings-{}-{}.json",
        std::process::id(),
        n
    ))
}

/// Ordered record of every side effect, shared between fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == entry)
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    journal: Journal,
    answers: Mutex<Vec<String>>,
    entities: Mutex<HashMap<i64, Entity>>,
    dialogs: Mutex<Vec<Dialog>>,
    folders: Mutex<Vec<DialogFolder>>,
    caches: Mutex<HashMap<CacheKind, usize>>,
    failing: Mutex<HashSet<String>>,
    next_id: AtomicI32,
}

impl FakeMessenger {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.entries()
    }

    pub fn answers(&self) -> Vec<String> {
        self.answers.lock().unwrap().clone()
    }

    pub fn last_answer(&self) -> String {
        self.answers.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn add_entity(&self, id: i64, name: &str) {
        self.entities.lock().unwrap().insert(
            id,
            Entity {
                id,
                display_name: name.to_string(),
                url: format!("https://t.me/c/{}", id.unsigned_abs()),
            },
        );
    }

    pub fn add_dialog(&self, id: i64, name: &str, is_channel: bool, participants: Option<i32>) {
        self.dialogs.lock().unwrap().push(Dialog {
            id,
            name: name.to_string(),
            is_channel,
            participants_count: participants,
        });
    }

    pub fn add_folder(&self, id: i32, title: &str) {
        self.folders.lock().unwrap().push(DialogFolder {
            id,
            title: title.to_string(),
        });
    }

    pub fn fill_cache(&self, kind: CacheKind, records: usize) {
        self.caches.lock().unwrap().insert(kind, records);
    }

    /// Makes every later call of `op` fail.
    pub fn fail_on(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    fn check(&self, op: &str) -> Result<(), Error> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(anyhow!("{} failed", op));
        }
        Ok(())
    }

    fn next_ref(&self, chat_id: i64) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    fn self_id(&self) -> UserId {
        SELF_ID
    }

    async fn answer(&self, message: &IncomingMessage, text: &str) -> Result<MessageRef, Error> {
        self.check("answer")?;
        self.answers.lock().unwrap().push(text.to_string());
        self.journal.record("answer");
        Ok(message.form_ref())
    }

    async fn get_entity(&self, id: i64) -> Result<Entity, Error> {
        self.entities
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("Could not find the input entity for {}", id))
    }

    async fn dialogs(&self) -> Result<Vec<Dialog>, Error> {
        self.check("dialogs")?;
        Ok(self.dialogs.lock().unwrap().clone())
    }

    async fn delete_dialog(&self, peer: i64) -> Result<(), Error> {
        self.journal.record(format!("delete_dialog {}", peer));
        self.check("delete_dialog")
    }

    async fn dialog_folders(&self) -> Result<Vec<DialogFolder>, Error> {
        self.check("dialog_folders")?;
        Ok(self.folders.lock().unwrap().clone())
    }

    async fn delete_dialog_folder(&self, folder_id: i32) -> Result<(), Error> {
        self.journal.record(format!("delete_folder {}", folder_id));
        self.check("delete_dialog_folder")
    }

    async fn converse(&self, peer: &str, text: &str) -> Result<ConversationTurn, Error> {
        self.journal.record(format!("converse {} {}", peer, text));
        self.check("converse")?;
        Ok(ConversationTurn {
            sent: self.next_ref(93372553),
            response: self.next_ref(93372553),
            response_text: "Done!".to_string(),
        })
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), Error> {
        self.journal
            .record(format!("delete_message {}", message.message_id));
        self.check("delete_message")
    }

    async fn join_channel(&self, channel: &str) -> Result<(), Error> {
        self.journal.record(format!("join_channel {}", channel));
        self.check("join_channel")
    }

    async fn log_out(&self) -> Result<(), Error> {
        self.journal.record("log_out");
        self.check("log_out")
    }

    fn cache_len(&self, kind: CacheKind) -> usize {
        self.caches.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    fn clear_cache(&self, kind: CacheKind) -> usize {
        self.caches.lock().unwrap().remove(&kind).unwrap_or(0)
    }

    async fn refresh_me(&self) -> Result<(), Error> {
        self.journal.record("refresh_me");
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeInline {
    journal: Journal,
    screens: Mutex<Vec<(String, Markup)>>,
    callback_answers: Mutex<Vec<(String, bool)>>,
    blocked: AtomicBool,
    next_id: AtomicI32,
}

impl FakeInline {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    /// Simulates a chat where inline forms cannot be shown.
    pub fn block(&self) {
        self.blocked.store(true, Ordering::SeqCst);
    }

    pub fn last_text(&self) -> String {
        self.screens
            .lock()
            .unwrap()
            .last()
            .map(|(text, _)| text.clone())
            .unwrap_or_default()
    }

    pub fn last_markup(&self) -> Markup {
        self.screens
            .lock()
            .unwrap()
            .last()
            .map(|(_, markup)| markup.clone())
            .unwrap_or_default()
    }

    pub fn screens(&self) -> usize {
        self.screens.lock().unwrap().len()
    }

    pub fn callback_answers(&self) -> Vec<(String, bool)> {
        self.callback_answers.lock().unwrap().clone()
    }

    /// The button whose label is `text` on the last screen.
    pub fn find_button(&self, text: &str) -> Option<Button> {
        self.last_markup()
            .into_iter()
            .flatten()
            .find(|b| b.text == text)
    }
}

#[async_trait]
impl InlineUi for FakeInline {
    async fn form(
        &self,
        message: &IncomingMessage,
        text: &str,
        markup: Markup,
    ) -> Result<Option<MessageRef>, Error> {
        if self.blocked.load(Ordering::SeqCst) {
            return Ok(None);
        }

        self.journal.record("form");
        self.screens
            .lock()
            .unwrap()
            .push((text.to_string(), markup));
        Ok(Some(MessageRef {
            chat_id: message.chat_id,
            message_id: 500 + self.next_id.fetch_add(1, Ordering::SeqCst),
        }))
    }

    async fn edit(&self, _form: MessageRef, text: &str, markup: Markup) -> Result<(), Error> {
        self.journal.record("edit");
        self.screens
            .lock()
            .unwrap()
            .push((text.to_string(), markup));
        Ok(())
    }

    async fn answer_callback(
        &self,
        _call: &CallbackQuery,
        text: &str,
        show_alert: bool,
    ) -> Result<(), Error> {
        self.callback_answers
            .lock()
            .unwrap()
            .push((text.to_string(), show_alert));
        Ok(())
    }

    async fn delete(&self, form: MessageRef) -> Result<(), Error> {
        self.journal.record(format!("delete_form {}", form.message_id));
        Ok(())
    }

    fn bot_username(&self) -> Option<String> {
        Some(BOT_USERNAME.to_string())
    }

    fn bot_id(&self) -> Option<UserId> {
        Some(BOT_ID)
    }
}

pub struct FakeRegistry {
    journal: Journal,
    watchers: Mutex<Vec<String>>,
    commands: Vec<String>,
    join_requests: Mutex<VecDeque<ChannelJoinRequest>>,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self::with_journal(Journal::default())
    }
}

impl FakeRegistry {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            watchers: Mutex::new(vec!["Logger".into(), "AutoReply".into(), "Stats".into()]),
            commands: vec!["ping".into(), "help".into(), "settings".into()],
            join_requests: Mutex::new(VecDeque::new()),
        }
    }

    pub fn set_watchers(&self, names: &[&str]) {
        *self.watchers.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn queue_join_request(&self, request: ChannelJoinRequest) {
        self.join_requests.lock().unwrap().push_back(request);
    }
}

#[async_trait]
impl ModuleRegistry for FakeRegistry {
    fn watchers(&self) -> Vec<String> {
        self.watchers.lock().unwrap().clone()
    }

    fn commands(&self) -> Vec<String> {
        self.commands.clone()
    }

    fn has_module(&self, name: &str) -> bool {
        name == "Tester"
    }

    fn debug_methods(&self, module: &str) -> Vec<String> {
        if module == "Tester" {
            vec!["dump_state".into()]
        } else {
            vec![]
        }
    }

    async fn invoke_debug_method(
        &self,
        module: &str,
        method: &str,
        _message: &IncomingMessage,
    ) -> Result<String, Error> {
        self.journal.record(format!("invoke {} {}", module, method));
        Ok("<state ok>".to_string())
    }

    async fn reload_core(&self) -> Result<usize, Error> {
        self.journal.record("reload_core");
        Ok(12)
    }

    fn module_counts(&self) -> ModuleCounts {
        ModuleCounts {
            total: 20,
            core: 12,
            user: 8,
        }
    }

    fn take_channel_join_request(&self) -> Option<ChannelJoinRequest> {
        self.join_requests.lock().unwrap().pop_front()
    }

    async fn invoke_command(&self, command: &str, args: &str) -> Result<(), Error> {
        self.journal
            .record(format!("invoke_command {} {}", command, args));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRuntime {
    journal: Journal,
}

impl FakeRuntime {
    pub fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }
}

#[async_trait]
impl Runtime for FakeRuntime {
    async fn flood_wait(&self) {
        self.journal.record("flood_wait");
    }

    fn restart(&self) {
        self.journal.record("restart");
    }

    fn set_custom_emojis(&self, enabled: bool) {
        self.journal.record(format!("custom_emojis {}", enabled));
    }
}

#[derive(Default)]
pub struct FakeDashboard {
    running: AtomicBool,
    starts: AtomicUsize,
}

impl FakeDashboard {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dashboard for FakeDashboard {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start(&self) -> Result<(), Error> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn url(&self, proxy_pass: bool) -> Result<String, Error> {
        Ok(if proxy_pass {
            "https://tunnel.example/abc".to_string()
        } else {
            "http://127.0.0.1:8080".to_string()
        })
    }
}

#[derive(Default)]
pub struct FakeLogControl {
    journal: Journal,
}

impl FakeLogControl {
    pub fn with_journal(journal: Journal) -> Self {
        Self { journal }
    }
}

impl LogControl for FakeLogControl {
    fn silence(&self) {
        self.journal.record("silence_logs");
    }
}

/// A fully wired [`Data`] over fakes and an in-memory store.
pub struct TestEnv {
    pub data: Data,
    pub journal: Journal,
    pub kv: Arc<dyn KvStore>,
    pub config: Arc<GlobalConfig>,
    pub messenger: Arc<FakeMessenger>,
    pub inline: Arc<FakeInline>,
    pub registry: Arc<FakeRegistry>,
    pub dashboard: Arc<FakeDashboard>,
    config_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(mut settings: Settings) -> Self {
        let journal = Journal::default();
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let config_path = temp_config_path();
        settings.config_path = config_path.clone();

        let messenger = Arc::new(FakeMessenger::with_journal(journal.clone()));
        let inline = Arc::new(FakeInline::with_journal(journal.clone()));
        let registry = Arc::new(FakeRegistry::with_journal(journal.clone()));
        let dashboard = Arc::new(FakeDashboard::default());

        let host = Host {
            registry: registry.clone(),
            messenger: messenger.clone(),
            inline: inline.clone(),
            runtime: Arc::new(FakeRuntime::with_journal(journal.clone())),
            dashboard: dashboard.clone(),
            log_control: Arc::new(FakeLogControl::with_journal(journal.clone())),
        };
        let config = Arc::new(GlobalConfig::new(&config_path));

        Self {
            data: Data::new(kv.clone(), config.clone(), settings, host),
            journal,
            kv,
            config,
            messenger,
            inline,
            registry,
            dashboard,
            config_path,
        }
    }

    /// An outgoing command typed by the account owner in a group.
    pub fn group_message(&self, chat_id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            id: 1,
            chat_id,
            sender_id: SELF_ID,
            is_private: false,
            text: text.to_string(),
            reply_sender_id: None,
            chat_title: Some("Test <Group>".to_string()),
        }
    }

    pub fn private_message(&self, text: &str) -> IncomingMessage {
        IncomingMessage {
            id: 1,
            chat_id: SELF_ID,
            sender_id: SELF_ID,
            is_private: true,
            text: text.to_string(),
            reply_sender_id: None,
            chat_title: None,
        }
    }

    /// A press of `button` on `form` by the owner.
    pub fn press(&self, form: MessageRef, button: &Button) -> CallbackQuery {
        let data = match &button.action {
            crate::services::host::ButtonAction::Callback(data) => data.clone(),
            other => panic!("button {:?} has no callback: {:?}", button.text, other),
        };
        CallbackQuery {
            id: "cb".to_string(),
            data,
            form,
            from: SELF_ID,
        }
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.config_path);
    }
}
