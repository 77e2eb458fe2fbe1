//! Bounded translation history log.
//! Newest-first, capacity 100, favorite flag and optional category per entry.
//! No expiry: entries only leave by eviction, removal, or clear.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;

/// A single translation history record, as persisted under `translation_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub original_text: String,
    pub translated_text: String,
    /// Display name, not code.
    pub from_language: String,
    pub to_language: String,
    /// Creation time, epoch millis.
    pub timestamp: i64,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// Payload for recording a translation; id and timestamp are assigned by the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub original_text: String,
    pub translated_text: String,
    pub from_language: String,
    pub to_language: String,
    pub is_favorite: bool,
    pub category_id: Option<String>,
}

impl NewHistoryEntry {
    pub fn new(
        original_text: impl Into<String>,
        translated_text: impl Into<String>,
        from_language: impl Into<String>,
        to_language: impl Into<String>,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            translated_text: translated_text.into(),
            from_language: from_language.into(),
            to_language: to_language.into(),
            ..Self::default()
        }
    }
}

/// Criteria used by the history screen. All set criteria must match.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Case-insensitive substring over original and translated text.
    pub query: Option<String>,
    pub favorites_only: bool,
    pub category: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if self.favorites_only && !entry.is_favorite {
            return false;
        }
        if let Some(category) = &self.category {
            if entry.category_id.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                entry.original_text.to_lowercase().contains(&q)
                    || entry.translated_text.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }
}

pub struct HistoryLog {
    entries: Arc<Vec<HistoryEntry>>,
    capacity: usize,
    max_text_chars: usize,
}

impl HistoryLog {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            capacity: config.history_capacity,
            max_text_chars: config.max_history_text_chars,
        }
    }

    /// Rebuild from a persisted list. Order is kept as stored; the cap still applies.
    pub fn from_persisted(config: &StoreConfig, mut entries: Vec<HistoryEntry>) -> Self {
        let mut log = Self::new(config);
        entries.truncate(log.capacity);
        log.entries = Arc::new(entries);
        log
    }

    /// Prepend a new record. Returns the stored entry, or None when the
    /// payload has blank or oversized text.
    pub fn append(&mut self, new: NewHistoryEntry, id: String, now: i64) -> Option<&HistoryEntry> {
        let original = new.original_text.trim();
        let translated = new.translated_text.trim();
        if original.is_empty() || translated.is_empty() {
            return None;
        }
        if new.original_text.chars().count() > self.max_text_chars
            || new.translated_text.chars().count() > self.max_text_chars
        {
            return None;
        }

        let entry = HistoryEntry {
            id,
            original_text: original.to_string(),
            translated_text: translated.to_string(),
            from_language: new.from_language,
            to_language: new.to_language,
            timestamp: now,
            is_favorite: new.is_favorite,
            category_id: new.category_id,
        };

        let entries = Arc::make_mut(&mut self.entries);
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        entries.first()
    }

    /// Remove the entry with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.entries.iter().any(|e| e.id == id) {
            return false;
        }
        Arc::make_mut(&mut self.entries).retain(|e| e.id != id);
        true
    }

    pub fn clear(&mut self) {
        self.entries = Arc::new(Vec::new());
    }

    /// Flip the favorite flag of `id`. Returns the new value, None if absent.
    pub fn toggle_favorite(&mut self, id: &str) -> Option<bool> {
        let entry = self.entry_mut(id)?;
        entry.is_favorite = !entry.is_favorite;
        Some(entry.is_favorite)
    }

    /// Tag `id` with a category. The id is not checked against the predefined list.
    pub fn set_category(&mut self, id: &str, category_id: &str) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.category_id = Some(category_id.to_string());
                true
            }
            None => false,
        }
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut HistoryEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Arc::make_mut(&mut self.entries).get_mut(idx)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries matching `filter`, newest first.
    pub fn filter(&self, filter: &HistoryFilter) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<HistoryEntry> {
        self.filter(&HistoryFilter {
            query: Some(query.to_string()),
            ..HistoryFilter::default()
        })
    }

    pub fn favorites(&self) -> Vec<HistoryEntry> {
        self.filter(&HistoryFilter {
            favorites_only: true,
            ..HistoryFilter::default()
        })
    }

    pub fn by_category(&self, category_id: &str) -> Vec<HistoryEntry> {
        self.filter(&HistoryFilter {
            category: Some(category_id.to_string()),
            ..HistoryFilter::default()
        })
    }

    /// Shared read-only view of the entries, newest first.
    pub fn snapshot(&self) -> Arc<Vec<HistoryEntry>> {
        Arc::clone(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
