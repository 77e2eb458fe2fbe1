//! Language value type, validation, and the built-in language table.

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;

/// A selectable language. Identity is `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Language {}

/// Why a language was refused by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LanguageRejection {
    #[error("language code is empty")]
    EmptyCode,
    #[error("language name is empty")]
    EmptyName,
    #[error("language code too long")]
    CodeTooLong,
    #[error("language name too long")]
    NameTooLong,
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            flag: None,
            native_name: None,
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn with_native_name(mut self, native_name: impl Into<String>) -> Self {
        self.native_name = Some(native_name.into());
        self
    }

    /// Check the code/name constraints the store enforces before accepting a
    /// language change. Lengths are measured in characters, untrimmed.
    pub fn validate(&self, config: &StoreConfig) -> Result<(), LanguageRejection> {
        if self.code.trim().is_empty() {
            return Err(LanguageRejection::EmptyCode);
        }
        if self.name.trim().is_empty() {
            return Err(LanguageRejection::EmptyName);
        }
        if self.code.chars().count() > config.max_language_code_chars {
            return Err(LanguageRejection::CodeTooLong);
        }
        if self.name.chars().count() > config.max_language_name_chars {
            return Err(LanguageRejection::NameTooLong);
        }
        Ok(())
    }
}

// (code, name, flag, native name)
const SUPPORTED: &[(&str, &str, &str, &str)] = &[
    ("en", "English", "🇺🇸", "English"),
    ("fr", "French", "🇫🇷", "Français"),
    ("es", "Spanish", "🇪🇸", "Español"),
    ("de", "German", "🇩🇪", "Deutsch"),
    ("it", "Italian", "🇮🇹", "Italiano"),
    ("pt", "Portuguese", "🇵🇹", "Português"),
    ("ru", "Russian", "🇷🇺", "Русский"),
    ("ja", "Japanese", "🇯🇵", "日本語"),
    ("ko", "Korean", "🇰🇷", "한국어"),
    ("zh", "Chinese", "🇨🇳", "中文"),
    ("ar", "Arabic", "🇸🇦", "العربية"),
    ("hi", "Hindi", "🇮🇳", "हिन्दी"),
    ("tr", "Turkish", "🇹🇷", "Türkçe"),
    ("nl", "Dutch", "🇳🇱", "Nederlands"),
    ("pl", "Polish", "🇵🇱", "Polski"),
    ("uk", "Ukrainian", "🇺🇦", "Українська"),
];

/// All languages offered by the language selector, in display order.
pub fn supported_languages() -> Vec<Language> {
    SUPPORTED
        .iter()
        .map(|(code, name, flag, native)| {
            Language::new(*code, *name)
                .with_flag(*flag)
                .with_native_name(*native)
        })
        .collect()
}

/// Look up a built-in language by code (case-insensitive).
pub fn find_language(code: &str) -> Option<Language> {
    supported_languages()
        .into_iter()
        .find(|l| l.code.eq_ignore_ascii_case(code.trim()))
}

/// Source language used before any settings are loaded.
pub fn default_from_language() -> Language {
    supported_languages().swap_remove(0)
}

/// Target language used before any settings are loaded.
pub fn default_to_language() -> Language {
    supported_languages().swap_remove(2)
}
