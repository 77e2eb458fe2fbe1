//! Scoped access to the translation store for code that cannot take it as a
//! parameter. A store is provided for the duration of a future; asking for it
//! outside such a scope is a wiring bug and panics.

use std::future::Future;

use crate::store::TranslationStore;

tokio::task_local! {
    static STORE: TranslationStore;
}

/// Run `fut` with `store` available through [`use_translation_store`].
pub async fn provide<F: Future>(store: TranslationStore, fut: F) -> F::Output {
    STORE.scope(store, fut).await
}

/// Synchronous variant of [`provide`].
pub fn provide_sync<R>(store: TranslationStore, f: impl FnOnce() -> R) -> R {
    STORE.sync_scope(store, f)
}

/// The store of the enclosing provider, if any.
pub fn try_use_translation_store() -> Option<TranslationStore> {
    STORE.try_with(|store| store.clone()).ok()
}

/// The store of the enclosing provider.
///
/// # Panics
///
/// Panics when called outside [`provide`] / [`provide_sync`].
pub fn use_translation_store() -> TranslationStore {
    match try_use_translation_store() {
        Some(store) => store,
        None => panic!("use_translation_store must be called within a store provider"),
    }
}
