//! Bounded, time-expiring translation cache.
//! Key: lowercase(trim(text)) + "_" + from_code + "_" + to_code.
//! Newest-first list, capacity 500, freshness window 7 days.
//!
//! The list is held behind an `Arc` so readers get cheap copy-on-write
//! snapshots; mutation clones the list only while a snapshot is alive.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;

/// One cached translation, as persisted under `translation_cache`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub original_text: String,
    pub translated_text: String,
    pub from_language: String,
    pub to_language: String,
    /// Insertion time, epoch millis.
    pub timestamp: i64,
}

pub struct TranslationCache {
    entries: Arc<Vec<CacheEntry>>,
    capacity: usize,
    ttl_ms: i64,
    max_text_chars: usize,
}

impl TranslationCache {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            capacity: config.cache_capacity,
            ttl_ms: config.cache_ttl_ms(),
            max_text_chars: config.max_cache_text_chars,
        }
    }

    /// Rebuild the cache from a persisted snapshot, dropping entries outside
    /// the freshness window. Returns the cache and the number of entries dropped.
    pub fn from_persisted(config: &StoreConfig, entries: Vec<CacheEntry>, now: i64) -> (Self, usize) {
        let mut cache = Self::new(config);
        let total = entries.len();
        let cutoff = now - cache.ttl_ms;
        let mut fresh: Vec<CacheEntry> = entries
            .into_iter()
            .filter(|e| e.timestamp > cutoff)
            .collect();
        fresh.truncate(cache.capacity);
        let dropped = total - fresh.len();
        cache.entries = Arc::new(fresh);
        (cache, dropped)
    }

    /// Compute the cache key from translation parameters.
    pub fn compute_key(text: &str, from_lang: &str, to_lang: &str) -> String {
        format!("{}_{}_{}", text.trim().to_lowercase(), from_lang, to_lang)
    }

    /// Look up a cached translation. Returns None if absent or older than the
    /// freshness window. Stale entries are left in place.
    pub fn lookup_at(&self, text: &str, from_lang: &str, to_lang: &str, now: i64) -> Option<String> {
        if text.trim().is_empty() || from_lang.is_empty() || to_lang.is_empty() {
            return None;
        }
        let key = Self::compute_key(text, from_lang, to_lang);
        self.entries
            .iter()
            .find(|e| e.key == key)
            .filter(|e| self.is_fresh(e, now))
            .map(|e| e.translated_text.clone())
    }

    /// Insert a translation result. Returns false (and leaves the cache
    /// untouched) for blank text, blank translation, blank language codes, or
    /// source text over the length limit.
    ///
    /// A prior entry with the same key is replaced. Entries already outside
    /// the freshness window are pruned before the capacity cut so they never
    /// hold a slot against fresh ones.
    pub fn insert_at(
        &mut self,
        text: &str,
        translation: &str,
        from_lang: &str,
        to_lang: &str,
        now: i64,
    ) -> bool {
        if text.trim().is_empty() || translation.trim().is_empty() {
            return false;
        }
        if from_lang.is_empty() || to_lang.is_empty() {
            return false;
        }
        if text.chars().count() > self.max_text_chars {
            return false;
        }

        let key = Self::compute_key(text, from_lang, to_lang);
        let entry = CacheEntry {
            key: key.clone(),
            original_text: text.trim().to_string(),
            translated_text: translation.trim().to_string(),
            from_language: from_lang.to_string(),
            to_language: to_lang.to_string(),
            timestamp: now,
        };

        let cutoff = now - self.ttl_ms;
        let entries = Arc::make_mut(&mut self.entries);
        entries.retain(|e| e.key != key && e.timestamp > cutoff);
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        true
    }

    fn is_fresh(&self, entry: &CacheEntry, now: i64) -> bool {
        now - entry.timestamp < self.ttl_ms
    }

    /// Shared read-only view of the entries, newest first.
    pub fn snapshot(&self) -> Arc<Vec<CacheEntry>> {
        Arc::clone(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn cache() -> TranslationCache {
        TranslationCache::new(&StoreConfig::default())
    }

    #[test]
    fn key_is_normalized() {
        assert_eq!(TranslationCache::compute_key("  Hello ", "en", "es"), "hello_en_es");
    }

    #[test]
    fn lookup_normalizes_text() {
        let mut c = cache();
        assert!(c.insert_at("Hello", "Hola", "en", "es", NOW));
        assert_eq!(c.lookup_at("Hello ", "en", "es", NOW).as_deref(), Some("Hola"));
        assert_eq!(c.lookup_at("hello", "en", "es", NOW).as_deref(), Some("Hola"));
        assert_eq!(c.lookup_at("hello", "es", "en", NOW), None);
    }

    #[test]
    fn duplicate_key_replaces_prior_entry() {
        let mut c = cache();
        c.insert_at("Hello", "Hola", "en", "es", NOW);
        c.insert_at("Other", "Otro", "en", "es", NOW + 1);
        c.insert_at("hello", "Buenas", "en", "es", NOW + 2);

        let snap = c.snapshot();
        let matching: Vec<_> = snap.iter().filter(|e| e.key == "hello_en_es").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].translated_text, "Buenas");
        assert_eq!(matching[0].timestamp, NOW + 2);
        assert_eq!(snap[0].key, "hello_en_es");
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut c = cache();
        for i in 0..501 {
            c.insert_at(&format!("text {i}"), &format!("t{i}"), "en", "fr", NOW + i);
        }
        assert_eq!(c.len(), 500);
        assert_eq!(c.lookup_at("text 0", "en", "fr", NOW + 501), None);
        assert_eq!(c.lookup_at("text 1", "en", "fr", NOW + 501).as_deref(), Some("t1"));
        assert_eq!(c.snapshot()[0].original_text, "text 500");
    }

    #[test]
    fn stale_entry_is_a_miss_but_stays_stored() {
        let mut c = cache();
        c.insert_at("Old", "Viejo", "en", "es", NOW - 8 * DAY_MS);
        assert_eq!(c.lookup_at("Old", "en", "es", NOW), None);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn entry_inside_window_is_a_hit() {
        let mut c = cache();
        c.insert_at("Recent", "Reciente", "en", "es", NOW - 6 * DAY_MS);
        assert_eq!(c.lookup_at("Recent", "en", "es", NOW).as_deref(), Some("Reciente"));
    }

    #[test]
    fn insert_prunes_stale_entries() {
        let mut c = cache();
        c.insert_at("Old", "Viejo", "en", "es", NOW - 8 * DAY_MS);
        c.insert_at("New", "Nuevo", "en", "es", NOW);
        assert_eq!(c.len(), 1);
        assert_eq!(c.snapshot()[0].original_text, "New");
    }

    #[test]
    fn invalid_inserts_are_ignored() {
        let mut c = cache();
        assert!(!c.insert_at("   ", "x", "en", "es", NOW));
        assert!(!c.insert_at("x", "  ", "en", "es", NOW));
        assert!(!c.insert_at("x", "y", "", "es", NOW));
        assert!(!c.insert_at(&"a".repeat(1001), "y", "en", "es", NOW));
        assert!(c.is_empty());
        assert!(c.insert_at(&"a".repeat(1000), "y", "en", "es", NOW));
    }

    #[test]
    fn stored_text_is_trimmed() {
        let mut c = cache();
        c.insert_at("  Bonjour  ", " Hello ", "fr", "en", NOW);
        let snap = c.snapshot();
        assert_eq!(snap[0].original_text, "Bonjour");
        assert_eq!(snap[0].translated_text, "Hello");
    }

    #[test]
    fn snapshot_is_unaffected_by_later_inserts() {
        let mut c = cache();
        c.insert_at("a", "1", "en", "es", NOW);
        let before = c.snapshot();
        c.insert_at("b", "2", "en", "es", NOW);
        assert_eq!(before.len(), 1);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn load_drops_expired_entries() {
        let entry = |text: &str, ts: i64| CacheEntry {
            key: TranslationCache::compute_key(text, "en", "es"),
            original_text: text.into(),
            translated_text: "x".into(),
            from_language: "en".into(),
            to_language: "es".into(),
            timestamp: ts,
        };
        let persisted = vec![entry("fresh", NOW - DAY_MS), entry("stale", NOW - 8 * DAY_MS)];
        let (c, dropped) = TranslationCache::from_persisted(&StoreConfig::default(), persisted, NOW);
        assert_eq!(dropped, 1);
        assert_eq!(c.len(), 1);
        assert_eq!(c.lookup_at("fresh", "en", "es", NOW).as_deref(), Some("x"));
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let mut c = cache();
        c.insert_at("Hi", "Salut", "en", "fr", NOW);
        let json = serde_json::to_value(&*c.snapshot()).unwrap();
        assert_eq!(json[0]["originalText"], "Hi");
        assert_eq!(json[0]["translatedText"], "Salut");
        assert_eq!(json[0]["fromLanguage"], "en");
        assert_eq!(json[0]["timestamp"], NOW);
    }
}
