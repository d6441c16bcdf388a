use std::path::PathBuf;
use thiserror::Error;

/// Top-level failure reported by a pipeline run. Conversion, API and docx
/// rewrite failures keep their own types so callers can tell an
/// authentication problem apart from a broken converter install.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("{detail}")]
    Usage { detail: String },

    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("input is not a PDF: {path}")]
    NotAPdf { path: PathBuf },

    #[error("unsupported target language '{code}' (see --show-supported-languages)")]
    UnsupportedLanguage { code: String },

    #[error("unsupported source language '{code}' (expected a supported code or 'auto')")]
    UnsupportedSourceLanguage { code: String },

    #[error("failed to load settings from {path}: {detail}")]
    Settings { path: PathBuf, detail: String },

    #[error("failed to parse embedded language table: {detail}")]
    LanguageTable { detail: String },

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Docx(#[from] DocxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the external document converter (Converter-In and
/// Converter-Out are the same tool run with different targets).
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(
        "document converter not found (tried: {tried}); install LibreOffice or set [converter] command"
    )]
    ToolUnavailable { tried: String },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed converting {input} to {format}: {stderr}")]
    Failed {
        tool: String,
        input: PathBuf,
        format: &'static str,
        stderr: String,
    },

    #[error("{tool} reported success but produced no {format} output at {path}")]
    MissingOutput {
        tool: String,
        format: &'static str,
        path: PathBuf,
    },
}

/// Failures of the DeepL translation API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no DeepL auth key (pass --auth-key or set DEEPL_AUTH_KEY)")]
    MissingKey,

    #[error("DeepL authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("DeepL quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("DeepL rate limit persisted after {attempts} attempts")]
    RateLimited { attempts: usize },

    #[error("DeepL request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("malformed DeepL response: {detail}")]
    MalformedResponse { detail: String },

    #[error("DeepL transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failures while rewriting the DOCX container itself.
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("failed to read docx archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to rewrite document xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io error while rewriting docx: {0}")]
    Io(#[from] std::io::Error),
}
