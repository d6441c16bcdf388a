use std::path::{Path, PathBuf};

pub mod convert;
pub mod deepl;
pub mod document;
pub mod docx;
pub mod error;
pub mod languages;
pub mod logging;
pub mod pipeline;
pub mod settings;

pub use deepl::{DeeplClient, Translate, TranslationFuture};
pub use error::{ApiError, ConvertError, DocxError, TranslateError};

use languages::LanguageRegistry;

#[derive(Debug, Clone)]
pub struct Config {
    pub pdf_path: Option<String>,
    pub target_lang: Option<String>,
    pub auth_key: Option<String>,
    pub output: Option<String>,
    pub source_lang: String,
    pub settings_path: Option<String>,
    pub keep_intermediate: bool,
    pub show_supported_languages: bool,
}

pub async fn run(config: Config) -> Result<String, TranslateError> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let registry = LanguageRegistry::load()?;

    if config.show_supported_languages {
        return Ok(registry.listing());
    }

    let pdf_path = config.pdf_path.as_deref().ok_or_else(|| {
        TranslateError::Usage {
            detail: "missing <path_to_pdf> argument".to_string(),
        }
    })?;
    let target = config.target_lang.as_deref().ok_or_else(|| {
        TranslateError::Usage {
            detail: "missing <target_language> argument".to_string(),
        }
    })?;

    if !registry.is_supported(target) {
        return Err(TranslateError::UnsupportedLanguage {
            code: target.to_string(),
        });
    }
    let source_lang = resolve_source_lang(&config.source_lang, &registry)?;

    let auth_key = resolve_auth_key(config.auth_key.as_deref())?;

    let target_code = registry.api_code(target);
    let mut client = DeeplClient::new(auth_key, target_code.clone(), &settings)?;
    if let Some(source) = source_lang {
        client = client.with_source_lang(registry.api_code(&source));
    }

    let options = pipeline::PipelineOptions {
        output: config.output.map(PathBuf::from),
        keep_intermediate: config.keep_intermediate,
    };
    let output =
        pipeline::execute(Path::new(pdf_path), &target_code, &client, &settings, &options).await?;
    Ok(format!("translated pdf written to {}", output.display()))
}

fn resolve_source_lang(
    source_lang: &str,
    registry: &LanguageRegistry,
) -> Result<Option<String>, TranslateError> {
    let trimmed = source_lang.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    if !registry.is_supported(trimmed) {
        return Err(TranslateError::UnsupportedSourceLanguage {
            code: trimmed.to_string(),
        });
    }
    Ok(Some(trimmed.to_string()))
}

fn resolve_auth_key(override_key: Option<&str>) -> Result<String, ApiError> {
    if let Some(key) = override_key {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    get_env("DEEPL_AUTH_KEY").ok_or(ApiError::MissingKey)
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
