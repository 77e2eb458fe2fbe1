//! Snaplingo: photo translation store.
//! Local translation cache, history log and settings with write-back
//! persistence, plus the remote OCR/translation pipeline that feeds them.

pub mod cache;
pub mod categories;
pub mod config;
pub mod context;
pub mod debounce;
pub mod error;
pub mod export;
pub mod history;
pub mod language;
pub mod lifecycle;
pub mod network;
pub mod pipeline;
pub mod remote;
pub mod settings;
pub mod storage;
pub mod store;

use std::sync::Arc;

use tracing::{info, warn};

use config::AppConfig;
use network::HttpProbe;
use pipeline::TranslationPipeline;
use remote::LlmClient;
use storage::{KeyValueStore, MemoryStore, SqliteStore};

pub use history::{HistoryEntry, HistoryFilter, NewHistoryEntry};
pub use language::Language;
pub use store::{StoreSnapshot, TranslationStore};

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Install the global tracing subscriber. Honors `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snaplingo=debug")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// A loaded store plus the background services feeding it.
pub struct App {
    pub store: TranslationStore,
    /// Absent when the remote client could not be built; the store still
    /// serves history, favorites and cached translations.
    pub pipeline: Option<TranslationPipeline>,
    probe: Option<HttpProbe>,
}

impl App {
    /// Stop background probing. The store keeps its last reachability value.
    pub fn shutdown(&self) {
        if let Some(probe) = &self.probe {
            probe.stop();
        }
    }
}

/// Open storage, load the store, and report what was restored.
pub async fn run(config: AppConfig) -> App {
    info!(data_dir = %config.data_dir.display(), "snaplingo starting");

    let storage: Arc<dyn KeyValueStore> = match SqliteStore::open(&config.database_path()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "durable storage unavailable, using in-memory storage");
            Arc::new(MemoryStore::new())
        }
    };

    let store = TranslationStore::open(storage, config.store.clone()).await;

    let pipeline = match LlmClient::new(config.api_url.clone(), config.api_timeout) {
        Ok(client) => {
            info!(endpoint = %config.api_url, "remote translation client initialized");
            Some(TranslationPipeline::new(store.clone(), Arc::new(client)))
        }
        Err(e) => {
            warn!(error = %e, "remote client init failed, translation disabled");
            None
        }
    };

    let probe = match config.probe_url.clone() {
        Some(url) => match HttpProbe::start(url, config.probe_interval, config.api_timeout) {
            Ok(probe) => {
                store.attach_reachability(&probe);
                Some(probe)
            }
            Err(e) => {
                warn!(error = %e, "reachability probe failed to start");
                None
            }
        },
        None => None,
    };

    let snapshot = store.snapshot();
    info!(
        phase = %snapshot.phase,
        from = %snapshot.from_language.name,
        to = %snapshot.to_language.name,
        history = snapshot.history.len(),
        favorites = snapshot.history.iter().filter(|e| e.is_favorite).count(),
        cache = snapshot.cache.len(),
        online = snapshot.is_online,
        remote = pipeline.is_some(),
        "store ready"
    );

    App {
        store,
        pipeline,
        probe,
    }
}
