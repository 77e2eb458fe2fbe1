//! The persisted settings record: language pair and two preferences.
//! Written wholesale under `translation_settings`; missing fields fall back
//! to defaults on load.

use serde::{Deserialize, Serialize};

use crate::language::{default_from_language, default_to_language, Language};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(default = "default_from_language")]
    pub from_language: Language,
    #[serde(default = "default_to_language")]
    pub to_language: Language,
    #[serde(default = "enabled")]
    pub auto_translate: bool,
    #[serde(default = "enabled")]
    pub save_to_history: bool,
}

fn enabled() -> bool {
    true
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            from_language: default_from_language(),
            to_language: default_to_language(),
            auto_translate: true,
            save_to_history: true,
        }
    }
}
