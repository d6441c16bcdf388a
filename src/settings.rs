use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TranslateError;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: Option<String>,
    pub request_timeout_secs: u64,
    pub max_chars_per_request: usize,
    pub request_interval_ms: u64,
    pub converter_command: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout_secs: 60,
            max_chars_per_request: 5000,
            request_interval_ms: 500,
            converter_command: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    api: Option<ApiSettings>,
    translate: Option<TranslateSettings>,
    converter: Option<ConverterSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSettings {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateSettings {
    max_chars_per_request: Option<usize>,
    request_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConverterSettings {
    command: Option<String>,
}

/// Defaults, overridden in order by `settings.toml`, `settings.local.toml`,
/// then an explicit `--read-settings` file.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings, TranslateError> {
    let mut settings = Settings::default();

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(TranslateError::Settings {
                path: extra.to_path_buf(),
                detail: "file not found".to_string(),
            });
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|err| TranslateError::Settings {
                path: path.clone(),
                detail: err.to_string(),
            })?;
            let parsed: SettingsFile =
                toml::from_str(&content).map_err(|err| TranslateError::Settings {
                    path: path.clone(),
                    detail: err.to_string(),
                })?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(api) = incoming.api {
            if let Some(url) = api.url {
                if !url.trim().is_empty() {
                    self.api_url = Some(url);
                }
            }
            if let Some(secs) = api.timeout_secs {
                if secs > 0 {
                    self.request_timeout_secs = secs;
                }
            }
        }
        if let Some(translate) = incoming.translate {
            if let Some(max_chars) = translate.max_chars_per_request {
                if max_chars > 0 {
                    self.max_chars_per_request = max_chars;
                }
            }
            if let Some(interval) = translate.request_interval_ms {
                self.request_interval_ms = interval;
            }
        }
        if let Some(converter) = incoming.converter {
            if let Some(command) = converter.command {
                if !command.trim().is_empty() {
                    self.converter_command = Some(command);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Settings, SettingsFile};

    #[test]
    fn defaults_match_the_api_limits() {
        let settings = Settings::default();
        assert_eq!(settings.max_chars_per_request, 5000);
        assert_eq!(settings.request_interval_ms, 500);
        assert_eq!(settings.request_timeout_secs, 60);
        assert!(settings.api_url.is_none());
        assert!(settings.converter_command.is_none());
    }

    #[test]
    fn merge_overrides_only_present_values() {
        let incoming: SettingsFile = toml::from_str(
            r#"
[api]
url = "https://api.deepl.com/v2/translate"

[translate]
max_chars_per_request = 1000
"#,
        )
        .unwrap();
        let mut settings = Settings::default();
        settings.merge(incoming);
        assert_eq!(
            settings.api_url.as_deref(),
            Some("https://api.deepl.com/v2/translate")
        );
        assert_eq!(settings.max_chars_per_request, 1000);
        assert_eq!(settings.request_interval_ms, 500);
    }

    #[test]
    fn merge_ignores_blank_and_zero_values() {
        let incoming: SettingsFile = toml::from_str(
            r#"
[api]
url = "  "
timeout_secs = 0

[converter]
command = ""

[translate]
request_interval_ms = 0
"#,
        )
        .unwrap();
        let mut settings = Settings::default();
        settings.merge(incoming);
        assert!(settings.api_url.is_none());
        assert_eq!(settings.request_timeout_secs, 60);
        assert!(settings.converter_command.is_none());
        // zero interval is a valid way to disable pacing
        assert_eq!(settings.request_interval_ms, 0);
    }
}
