use serde::Deserialize;
use std::collections::HashMap;

use crate::error::TranslateError;

/// Registry of the two-letter target language codes DeepL accepts,
/// loaded from the embedded table.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    codes: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn load() -> Result<Self, TranslateError> {
        let raw = include_str!("deepl_targets.json");
        let parsed: TargetData =
            serde_json::from_str(raw).map_err(|err| TranslateError::LanguageTable {
                detail: err.to_string(),
            })?;
        Ok(LanguageRegistry {
            codes: parsed.codes,
        })
    }

    pub fn is_supported(&self, code: &str) -> bool {
        let code = normalize_code(code);
        code.len() == 2 && self.codes.contains_key(&code)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.codes.get(&normalize_code(code)).map(String::as_str)
    }

    /// Uppercase form sent on the wire (DeepL expects `SK`, not `sk`).
    pub fn api_code(&self, code: &str) -> String {
        normalize_code(code).to_uppercase()
    }

    /// `code<TAB>name` lines, sorted by code.
    pub fn listing(&self) -> String {
        let mut entries: Vec<_> = self.codes.iter().collect();
        entries.sort();
        entries
            .into_iter()
            .map(|(code, name)| format!("{}\t{}", code, name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[derive(Debug, Deserialize)]
struct TargetData {
    codes: HashMap<String, String>,
}
