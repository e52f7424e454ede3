use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::settings::parse_pairs;

/// Translation table loaded from `lang/<language>`.
#[derive(Clone, Debug, Default)]
pub struct I18n {
    texts: HashMap<String, String>,
}

impl I18n {
    pub fn parse(text: &str) -> Self {
        Self {
            texts: parse_pairs(text).into_iter().collect(),
        }
    }

    /// Loads a language file. A missing file yields an empty table, so every
    /// lookup falls back to the id.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                let i18n = Self::parse(&text);
                if i18n.is_empty() {
                    log::warn!("Language file {} has no translations", path.display());
                } else {
                    log::info!("Loaded {} translations from {}", i18n.len(), path.display());
                }
                i18n
            }
            Err(err) => {
                log::error!("Failed to read language file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Returns the translation of `id`, or `id` itself when unknown.
    pub fn text<'a>(&'a self, id: &'a str) -> &'a str {
        self.texts.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
