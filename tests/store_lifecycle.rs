use std::sync::Arc;
use std::time::Duration;

use snaplingo::config::{AppConfig, StoreConfig, CACHE_KEY};
use snaplingo::lifecycle::StorePhase;
use snaplingo::storage::{KeyValueStore, MemoryStore, SqliteStore};
use snaplingo::{Language, NewHistoryEntry, TranslationStore};

#[tokio::test]
async fn cached_translation_survives_restart() {
    let storage = Arc::new(MemoryStore::new());

    let store = TranslationStore::open(storage.clone(), StoreConfig::default()).await;
    assert_eq!(store.get_cached_translation("Bonjour", "fr", "en"), None);
    store.add_to_cache("Bonjour", "Hello", "fr", "en");
    assert_eq!(
        store.get_cached_translation("Bonjour", "fr", "en").as_deref(),
        Some("Hello")
    );
    store.wait_for_pending_writes().await;
    drop(store);

    let restarted = TranslationStore::open(storage, StoreConfig::default()).await;
    assert_eq!(
        restarted.get_cached_translation("Bonjour", "fr", "en").as_deref(),
        Some("Hello")
    );
}

#[tokio::test]
async fn full_state_survives_restart_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snaplingo.db");

    {
        let storage = Arc::new(SqliteStore::open(&path).unwrap());
        let store = TranslationStore::open(storage, StoreConfig::default()).await;
        assert_eq!(store.phase(), StorePhase::Ready);

        store.set_from_language(Language::new("fr", "French"));
        store.set_to_language(Language::new("en", "English"));
        store.set_auto_translate(false);
        store.add_to_cache("Merci", "Thank you", "fr", "en");
        store.add_to_history(NewHistoryEntry::new("Merci", "Thank you", "French", "English"));
        let id = store.history()[0].id.clone();
        // Writes to one key are not ordered against each other; let each land.
        store.wait_for_pending_writes().await;
        store.toggle_favorite(&id);
        store.wait_for_pending_writes().await;
        store.set_category(&id, "travel");

        // Settings land after the debounce window.
        tokio::time::sleep(Duration::from_millis(350)).await;
        store.wait_for_pending_writes().await;
    }

    let storage = Arc::new(SqliteStore::open(&path).unwrap());
    let store = TranslationStore::open(storage, StoreConfig::default()).await;

    assert_eq!(store.from_language().code, "fr");
    assert_eq!(store.to_language().code, "en");
    assert!(!store.auto_translate());
    assert!(store.save_to_history());
    assert_eq!(
        store.get_cached_translation("merci", "fr", "en").as_deref(),
        Some("Thank you")
    );

    let history = store.history();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_favorite);
    assert_eq!(history[0].category_id.as_deref(), Some("travel"));
}

#[tokio::test]
async fn corrupt_cache_is_cleared_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snaplingo.db");

    let storage = Arc::new(SqliteStore::open(&path).unwrap());
    storage.set_item(CACHE_KEY, "not json at all").await.unwrap();

    let store = TranslationStore::open(storage.clone(), StoreConfig::default()).await;
    assert!(store.cache_entries().is_empty());
    assert_eq!(storage.get_item(CACHE_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn run_wires_store_and_remote_client() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_dir: dir.path().join("data"),
        ..AppConfig::default()
    };
    let db_path = config.database_path();

    let app = snaplingo::run(config).await;

    assert!(app.store.is_ready());
    assert!(db_path.exists());
    let pipeline = app.pipeline.as_ref().expect("remote client should be built");
    assert!(pipeline.store().is_ready());
    assert_eq!(pipeline.store().to_language().code, "es");

    app.shutdown();
    app.store.wait_for_pending_writes().await;
}
