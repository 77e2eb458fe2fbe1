//! Translation store coordinator.
//! Owns settings, history and cache; loads them once at startup, then writes
//! back on every change: history/cache immediately, settings debounced 300ms.
//! Every write serializes the current full snapshot, never a delta.
//!
//! Mutation methods update memory synchronously and return; persistence runs
//! in background tasks whose failures are logged and otherwise ignored.
//! Mutations spawn tasks, so they must be called from within a Tokio runtime.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, TranslationCache};
use crate::config::{StoreConfig, CACHE_KEY, HISTORY_KEY, SETTINGS_KEY};
use crate::debounce::Debouncer;
use crate::error::StoreError;
use crate::history::{HistoryEntry, HistoryFilter, HistoryLog, NewHistoryEntry};
use crate::language::Language;
use crate::lifecycle::{Lifecycle, StorePhase};
use crate::network::Reachability;
use crate::now_millis;
use crate::settings::SettingsRecord;
use crate::storage::KeyValueStore;

/// Read-only view published to consumers after every change.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub phase: StorePhase,
    pub from_language: Language,
    pub to_language: Language,
    pub auto_translate: bool,
    pub save_to_history: bool,
    pub is_online: bool,
    pub history: Arc<Vec<HistoryEntry>>,
    pub cache: Arc<Vec<CacheEntry>>,
}

struct State {
    settings: SettingsRecord,
    history: HistoryLog,
    cache: TranslationCache,
    is_online: bool,
    /// Last issued history id, kept monotonic so ids stay unique within a millisecond.
    last_id: i64,
}

struct Inner {
    config: StoreConfig,
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<State>,
    lifecycle: Lifecycle,
    snapshot_tx: watch::Sender<StoreSnapshot>,
    writes: TaskTracker,
    settings_debounce: Debouncer,
}

/// Shared handle to the store. Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct TranslationStore {
    inner: Arc<Inner>,
}

impl TranslationStore {
    /// Create a store holding defaults. Nothing is persisted until [`load`](Self::load) completes.
    pub fn new(storage: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        let state = State {
            settings: SettingsRecord::default(),
            history: HistoryLog::new(&config),
            cache: TranslationCache::new(&config),
            is_online: true,
            last_id: 0,
        };
        let lifecycle = Lifecycle::new();
        let (snapshot_tx, _) = watch::channel(build_snapshot(&state, lifecycle.current()));
        let writes = TaskTracker::new();
        let settings_debounce =
            Debouncer::new("settings", config.settings_debounce, writes.clone());

        Self {
            inner: Arc::new(Inner {
                config,
                storage,
                state: Mutex::new(state),
                lifecycle,
                snapshot_tx,
                writes,
                settings_debounce,
            }),
        }
    }

    /// Create and load in one step.
    pub async fn open(storage: Arc<dyn KeyValueStore>, config: StoreConfig) -> Self {
        let store = Self::new(storage, config);
        store.load().await;
        store
    }

    /// Read settings, history and cache concurrently, then mark the store Ready.
    /// Each record is parsed independently; a malformed record is discarded
    /// and deleted from storage. Only the first call has any effect.
    pub async fn load(&self) {
        if self.inner.lifecycle.transition(StorePhase::Loading).is_err() {
            return;
        }
        self.publish();

        let storage = &self.inner.storage;
        let (settings_raw, history_raw, cache_raw) = tokio::join!(
            storage.get_item(SETTINGS_KEY),
            storage.get_item(HISTORY_KEY),
            storage.get_item(CACHE_KEY),
        );

        let (settings, history, cache) = tokio::join!(
            self.parse_record::<SettingsRecord>(SETTINGS_KEY, settings_raw),
            self.parse_record::<Vec<serde_json::Value>>(HISTORY_KEY, history_raw),
            self.parse_record::<Vec<serde_json::Value>>(CACHE_KEY, cache_raw),
        );
        let history = history.map(|items| decode_items::<HistoryEntry>(HISTORY_KEY, items));
        let cache = cache.map(|items| decode_items::<CacheEntry>(CACHE_KEY, items));

        {
            let config = &self.inner.config;
            let mut state = self.inner.state.lock();
            if let Some(settings) = settings {
                info!(
                    from = %settings.from_language.name,
                    to = %settings.to_language.name,
                    "settings loaded"
                );
                state.settings = settings;
            }
            if let Some(entries) = history {
                // Ids past the clock cannot have come from this store.
                let now = now_millis();
                state.last_id = entries
                    .iter()
                    .filter_map(|e| e.id.parse::<i64>().ok())
                    .filter(|id| *id <= now)
                    .max()
                    .unwrap_or(0);
                state.history = HistoryLog::from_persisted(config, entries);
                info!(count = state.history.len(), "history loaded");
            }
            if let Some(entries) = cache {
                let (cache, expired) = TranslationCache::from_persisted(config, entries, now_millis());
                info!(count = cache.len(), expired, "cache loaded");
                state.cache = cache;
            }
        }

        if self.inner.lifecycle.transition(StorePhase::Ready).is_ok() {
            self.publish();
        }
    }

    async fn parse_record<T: DeserializeOwned>(
        &self,
        key: &'static str,
        raw: Result<Option<String>, StoreError>,
    ) -> Option<T> {
        let text = match raw {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(key, "no saved record, using defaults");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "record read failed, using defaults");
                return None;
            }
        };

        match serde_json::from_str::<T>(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "malformed record, clearing");
                if let Err(e) = self.inner.storage.remove_item(key).await {
                    warn!(key, error = %e, "failed to clear malformed record");
                }
                None
            }
        }
    }

    /// Follow a reachability source for as long as both it and the store live.
    pub fn attach_reachability(&self, source: &dyn Reachability) {
        let mut rx = source.subscribe();
        let online = *rx.borrow_and_update();
        self.update_online(online);

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                match weak.upgrade() {
                    Some(inner) => TranslationStore { inner }.update_online(online),
                    None => return,
                }
            }
        });
    }

    fn update_online(&self, online: bool) {
        let mut state = self.inner.state.lock();
        if state.is_online != online {
            state.is_online = online;
            debug!(online, "store reachability updated");
        }
        self.publish_locked(&state);
    }

    // --- Reads ---

    pub fn phase(&self) -> StorePhase {
        self.inner.lifecycle.current()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lifecycle.is_ready()
    }

    /// Resolve once loading has completed.
    pub async fn wait_ready(&self) {
        self.inner.lifecycle.wait_ready().await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn settings(&self) -> SettingsRecord {
        self.inner.state.lock().settings.clone()
    }

    pub fn from_language(&self) -> Language {
        self.inner.state.lock().settings.from_language.clone()
    }

    pub fn to_language(&self) -> Language {
        self.inner.state.lock().settings.to_language.clone()
    }

    pub fn auto_translate(&self) -> bool {
        self.inner.state.lock().settings.auto_translate
    }

    pub fn save_to_history(&self) -> bool {
        self.inner.state.lock().settings.save_to_history
    }

    pub fn is_online(&self) -> bool {
        self.inner.state.lock().is_online
    }

    pub fn history(&self) -> Arc<Vec<HistoryEntry>> {
        self.inner.state.lock().history.snapshot()
    }

    pub fn filter_history(&self, filter: &HistoryFilter) -> Vec<HistoryEntry> {
        self.inner.state.lock().history.filter(filter)
    }

    pub fn history_entry(&self, id: &str) -> Option<HistoryEntry> {
        self.inner.state.lock().history.get(id).cloned()
    }

    pub fn search_history(&self, query: &str) -> Vec<HistoryEntry> {
        self.inner.state.lock().history.search(query)
    }

    pub fn favorites(&self) -> Vec<HistoryEntry> {
        self.inner.state.lock().history.favorites()
    }

    pub fn history_by_category(&self, category_id: &str) -> Vec<HistoryEntry> {
        self.inner.state.lock().history.by_category(category_id)
    }

    pub fn cache_entries(&self) -> Arc<Vec<CacheEntry>> {
        self.inner.state.lock().cache.snapshot()
    }

    /// Cached translation for (text, from, to), or None if absent or stale.
    pub fn get_cached_translation(&self, text: &str, from_lang: &str, to_lang: &str) -> Option<String> {
        self.inner
            .state
            .lock()
            .cache
            .lookup_at(text, from_lang, to_lang, now_millis())
    }

    // --- Settings ---

    pub fn set_from_language(&self, language: Language) {
        self.set_language(language, true);
    }

    pub fn set_to_language(&self, language: Language) {
        self.set_language(language, false);
    }

    fn set_language(&self, language: Language, source: bool) {
        if let Err(reason) = language.validate(&self.inner.config) {
            warn!(code = %language.code, reason = %reason, source, "language rejected");
            return;
        }
        info!(code = %language.code, name = %language.name, source, "language set");
        self.update_settings(|settings| {
            if source {
                settings.from_language = language;
            } else {
                settings.to_language = language;
            }
        });
    }

    pub fn set_auto_translate(&self, enabled: bool) {
        self.update_settings(|settings| settings.auto_translate = enabled);
    }

    pub fn set_save_to_history(&self, enabled: bool) {
        self.update_settings(|settings| settings.save_to_history = enabled);
    }

    fn update_settings(&self, apply: impl FnOnce(&mut SettingsRecord)) {
        {
            let mut state = self.inner.state.lock();
            apply(&mut state.settings);
            self.publish_locked(&state);
        }
        self.schedule_settings_write();
    }

    fn schedule_settings_write(&self) {
        if !self.is_ready() {
            debug!("settings write skipped, store not ready");
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let generation = self.inner.settings_debounce.schedule(move || async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            // Serialize whatever is current when the quiet period ends.
            let record = inner.state.lock().settings.clone();
            write_record(&*inner.storage, SETTINGS_KEY, &record).await;
        });
        debug!(generation, "settings write scheduled");
    }

    // --- History ---

    /// Record a translation. Ignored when saving is disabled or the text is
    /// blank or over the length limit.
    pub fn add_to_history(&self, entry: NewHistoryEntry) {
        let mut state = self.inner.state.lock();
        if !state.settings.save_to_history {
            debug!("history disabled, entry dropped");
            return;
        }
        let now = now_millis();
        let id = now.max(state.last_id.saturating_add(1));
        match state.history.append(entry, id.to_string(), now) {
            Some(stored) => {
                debug!(id = %stored.id, "history entry added");
            }
            None => {
                warn!("history entry rejected: blank or oversized text");
                return;
            }
        }
        state.last_id = id;
        self.publish_locked(&state);
        self.persist_history(state.history.snapshot());
    }

    pub fn remove_from_history(&self, id: &str) {
        let mut state = self.inner.state.lock();
        if !state.history.remove(id) {
            debug!(id, "history entry not found");
            return;
        }
        self.publish_locked(&state);
        self.persist_history(state.history.snapshot());
    }

    pub fn clear_history(&self) {
        {
            let mut state = self.inner.state.lock();
            state.history.clear();
            self.publish_locked(&state);
        }
        info!("history cleared");
        if !self.is_ready() {
            debug!("history removal skipped, store not ready");
            return;
        }
        let storage = Arc::clone(&self.inner.storage);
        self.inner.writes.spawn(async move {
            if let Err(e) = storage.remove_item(HISTORY_KEY).await {
                warn!(key = HISTORY_KEY, error = %e, "record removal failed");
            }
        });
    }

    pub fn toggle_favorite(&self, id: &str) {
        let mut state = self.inner.state.lock();
        match state.history.toggle_favorite(id) {
            Some(favorite) => debug!(id, favorite, "favorite toggled"),
            None => {
                debug!(id, "history entry not found");
                return;
            }
        }
        self.publish_locked(&state);
        self.persist_history(state.history.snapshot());
    }

    pub fn set_category(&self, id: &str, category_id: &str) {
        let mut state = self.inner.state.lock();
        if !state.history.set_category(id, category_id) {
            debug!(id, "history entry not found");
            return;
        }
        self.publish_locked(&state);
        self.persist_history(state.history.snapshot());
    }

    fn persist_history(&self, entries: Arc<Vec<HistoryEntry>>) {
        self.persist(HISTORY_KEY, entries);
    }

    // --- Cache ---

    pub fn add_to_cache(&self, text: &str, translation: &str, from_lang: &str, to_lang: &str) {
        let mut state = self.inner.state.lock();
        if !state
            .cache
            .insert_at(text, translation, from_lang, to_lang, now_millis())
        {
            debug!(from_lang, to_lang, "cache insert skipped");
            return;
        }
        self.publish_locked(&state);
        self.persist(CACHE_KEY, state.cache.snapshot());
    }

    // --- Persistence ---

    fn persist<T: Serialize + Send + Sync + 'static>(&self, key: &'static str, value: Arc<T>) {
        if !self.is_ready() {
            debug!(key, "write skipped, store not ready");
            return;
        }
        let storage = Arc::clone(&self.inner.storage);
        self.inner.writes.spawn(async move {
            write_record(&*storage, key, &*value).await;
        });
    }

    /// Wait until every issued write, including a pending debounced settings
    /// write, has finished.
    pub async fn wait_for_pending_writes(&self) {
        let writes = &self.inner.writes;
        writes.close();
        writes.wait().await;
        writes.reopen();
    }

    fn publish(&self) {
        let state = self.inner.state.lock();
        self.publish_locked(&state);
    }

    fn publish_locked(&self, state: &State) {
        self.inner
            .snapshot_tx
            .send_replace(build_snapshot(state, self.inner.lifecycle.current()));
    }
}

fn build_snapshot(state: &State, phase: StorePhase) -> StoreSnapshot {
    StoreSnapshot {
        phase,
        from_language: state.settings.from_language.clone(),
        to_language: state.settings.to_language.clone(),
        auto_translate: state.settings.auto_translate,
        save_to_history: state.settings.save_to_history,
        is_online: state.is_online,
        history: state.history.snapshot(),
        cache: state.cache.snapshot(),
    }
}

/// Decode each element on its own; elements that do not fit the record
/// shape are dropped and the rest are kept.
fn decode_items<T: DeserializeOwned>(key: &'static str, items: Vec<serde_json::Value>) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, index, error = %e, "dropping malformed element");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        info!(key, kept = decoded.len(), dropped = total - decoded.len(), "record partially restored");
    }
    decoded
}

async fn write_record<T: Serialize + ?Sized>(storage: &dyn KeyValueStore, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(key, error = %e, "record serialization failed");
            return;
        }
    };
    match storage.set_item(key, &json).await {
        Ok(()) => debug!(key, bytes = json.len(), "record written"),
        Err(e) => warn!(key, error = %e, "record write failed"),
    }
}
