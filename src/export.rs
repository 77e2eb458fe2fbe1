//! CSV and JSON renderings of the history log for sharing.
//! Only produces strings; writing files is left to the host.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;

use crate::categories::find_category;
use crate::history::HistoryEntry;

const CSV_HEADER: &str =
    "Original Text,Translated Text,From Language,To Language,Date,Favorite,Category\n";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// Nothing to export.
    #[error("no translations to export")]
    Empty,
    #[error("export serialization failed: {0}")]
    Serialization(String),
}

fn to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

fn quote(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// One row per entry; text columns are always quoted.
pub fn to_csv(entries: &[HistoryEntry]) -> Result<String, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::Empty);
    }
    let mut csv = String::from(CSV_HEADER);
    for entry in entries {
        let category = entry
            .category_id
            .as_deref()
            .and_then(find_category)
            .map(|c| c.name)
            .unwrap_or("");
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            quote(&entry.original_text),
            quote(&entry.translated_text),
            quote(&entry.from_language),
            quote(&entry.to_language),
            to_datetime(entry.timestamp).format("%Y-%m-%d"),
            if entry.is_favorite { "Yes" } else { "No" },
            category,
        ));
    }
    Ok(csv)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    export_date: String,
    total_translations: usize,
    translations: Vec<ExportedEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedEntry<'a> {
    id: &'a str,
    original_text: &'a str,
    translated_text: &'a str,
    from_language: &'a str,
    to_language: &'a str,
    timestamp: i64,
    date: String,
    is_favorite: bool,
    category: Option<ExportedCategory>,
}

#[derive(Serialize)]
struct ExportedCategory {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
}

/// Pretty-printed JSON document stamped with `now` (epoch millis).
pub fn to_json(entries: &[HistoryEntry], now: i64) -> Result<String, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::Empty);
    }
    let doc = ExportDocument {
        export_date: to_datetime(now).to_rfc3339_opts(SecondsFormat::Millis, true),
        total_translations: entries.len(),
        translations: entries
            .iter()
            .map(|e| ExportedEntry {
                id: &e.id,
                original_text: &e.original_text,
                translated_text: &e.translated_text,
                from_language: &e.from_language,
                to_language: &e.to_language,
                timestamp: e.timestamp,
                date: to_datetime(e.timestamp).to_rfc3339_opts(SecondsFormat::Millis, true),
                is_favorite: e.is_favorite,
                category: e.category_id.as_deref().and_then(find_category).map(|c| {
                    ExportedCategory {
                        id: c.id,
                        name: c.name,
                        icon: c.icon,
                    }
                }),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| ExportError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-01T12:00:00Z
    const TS: i64 = 1_709_294_400_000;

    fn entry(id: &str, original: &str, favorite: bool, category: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            id: id.into(),
            original_text: original.into(),
            translated_text: "Hello, \"friend\"".into(),
            from_language: "French".into(),
            to_language: "English".into(),
            timestamp: TS,
            is_favorite: favorite,
            category_id: category.map(String::from),
        }
    }

    #[test]
    fn empty_history_is_rejected() {
        assert_eq!(to_csv(&[]), Err(ExportError::Empty));
        assert_eq!(to_json(&[], TS), Err(ExportError::Empty));
        assert_eq!(ExportError::Empty.to_string(), "no translations to export");
    }

    #[test]
    fn csv_escapes_and_resolves_category() {
        let csv = to_csv(&[
            entry("1", "Salut, \"ami\"", true, Some("travel")),
            entry("2", "Bof", false, Some("bogus")),
        ])
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER.trim_end());
        assert_eq!(
            lines[1],
            r#""Salut, ""ami""","Hello, ""friend""","French","English",2024-03-01,Yes,Travel"#
        );
        assert!(lines[2].ends_with(",No,"));
    }

    #[test]
    fn json_carries_every_field() {
        let json = to_json(&[entry("1", "Salut", true, Some("food"))], TS).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["exportDate"], "2024-03-01T12:00:00.000Z");
        assert_eq!(value["totalTranslations"], 1);
        let t = &value["translations"][0];
        assert_eq!(t["id"], "1");
        assert_eq!(t["originalText"], "Salut");
        assert_eq!(t["timestamp"], TS);
        assert_eq!(t["isFavorite"], true);
        assert_eq!(t["category"]["name"], "Food");
    }

    #[test]
    fn json_category_is_null_when_unknown() {
        let json = to_json(&[entry("1", "Salut", false, None)], TS).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["translations"][0]["category"].is_null());
    }
}
