use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::warn;

use crate::error::ApiError;
use crate::settings::Settings;

pub const DEFAULT_API_URL: &str = "https://api-free.deepl.com/v2/translate";
const API_URL_ENV: &str = "DEEPL_API_URL";

pub(crate) const RATE_LIMIT_MAX_RETRIES: usize = 5;
pub(crate) const RATE_LIMIT_BASE_DELAY: Duration = Duration::from_secs(2);
pub(crate) const RATE_LIMIT_MAX_DELAY: Duration = Duration::from_secs(60);

pub type TranslationFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ApiError>> + Send + 'a>>;

/// The seam between the docx rewrite and the network. Tests swap in mocks.
pub trait Translate: Sync {
    fn translate<'a>(&'a self, text: &'a str) -> TranslationFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct DeeplClient {
    http: reqwest::Client,
    api_url: String,
    auth_key: String,
    target_lang: String,
    source_lang: Option<String>,
    max_chars: usize,
    request_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl DeeplClient {
    pub fn new(
        auth_key: impl Into<String>,
        target_lang: impl Into<String>,
        settings: &Settings,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: resolve_api_url(settings.api_url.as_deref()),
            auth_key: auth_key.into(),
            target_lang: target_lang.into(),
            source_lang: None,
            max_chars: settings.max_chars_per_request.max(1),
            request_interval: Duration::from_millis(settings.request_interval_ms),
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        let source_lang = source_lang.into();
        if !source_lang.trim().is_empty() {
            self.source_lang = Some(source_lang);
        }
        self
    }

    /// Translates one text, splitting it into sentence-bounded chunks when
    /// it exceeds the per-request character limit.
    pub async fn translate_text(&self, text: &str) -> Result<String, ApiError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let chunks = split_chunks(text, self.max_chars);
        let mut parts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            parts.push(self.request_chunk(chunk).await?);
        }
        Ok(parts.join(" "))
    }

    async fn request_chunk(&self, chunk: &str) -> Result<String, ApiError> {
        let body = request_body(chunk, &self.target_lang, self.source_lang.as_deref());
        let mut attempt = 0usize;
        let mut delay = RATE_LIMIT_BASE_DELAY;
        loop {
            attempt += 1;
            self.pace().await;
            let response = self
                .http
                .post(&self.api_url)
                .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let retry_after = retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            if status.is_success() {
                return extract_translation(&text);
            }
            if is_rate_limited(status, &text) {
                if attempt < RATE_LIMIT_MAX_RETRIES {
                    delay = wait_with_backoff(attempt, delay, retry_after).await;
                    continue;
                }
                return Err(ApiError::RateLimited { attempts: attempt });
            }
            return Err(classify_failure(status, &text));
        }
    }

    async fn pace(&self) {
        if self.request_interval.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.request_interval {
                sleep(self.request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Translate for DeeplClient {
    fn translate<'a>(&'a self, text: &'a str) -> TranslationFuture<'a> {
        Box::pin(self.translate_text(text))
    }
}

fn resolve_api_url(configured: Option<&str>) -> String {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        let url = url.trim();
        if !url.is_empty() {
            return url.to_string();
        }
    }
    if let Some(url) = configured {
        let url = url.trim();
        if !url.is_empty() {
            return url.to_string();
        }
    }
    DEFAULT_API_URL.to_string()
}

pub(crate) fn request_body(
    chunk: &str,
    target_lang: &str,
    source_lang: Option<&str>,
) -> serde_json::Value {
    let mut body = json!({
        "text": [chunk],
        "target_lang": target_lang,
    });
    if let Some(source) = source_lang {
        body["source_lang"] = json!(source);
    }
    body
}

pub(crate) fn extract_translation(body: &str) -> Result<String, ApiError> {
    let parsed: DeeplResponse =
        serde_json::from_str(body).map_err(|err| ApiError::MalformedResponse {
            detail: err.to_string(),
        })?;
    let first = parsed
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::MalformedResponse {
            detail: "empty translations array".to_string(),
        })?;
    Ok(first.text)
}

/// Terminal (non-retryable) status mapping. 456 is DeepL's quota-exhausted
/// status and must never be retried.
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status.as_u16() {
        401 | 403 => ApiError::Auth {
            status: status.as_u16(),
            message,
        },
        456 => ApiError::QuotaExceeded { message },
        _ => ApiError::Request {
            status: status.as_u16(),
            message,
        },
    }
}

pub(crate) fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    let code = status.as_u16();
    if code == 529 || code == 503 {
        return true;
    }
    let lower = body.to_lowercase();
    status.is_server_error() && (lower.contains("rate limit") || lower.contains("too many requests"))
}

pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    None
}

pub(crate) async fn wait_with_backoff(
    attempt: usize,
    delay: Duration,
    retry_after: Option<Duration>,
) -> Duration {
    let mut wait = delay;
    if let Some(retry_after) = retry_after
        && retry_after > wait
    {
        wait = retry_after;
    }
    warn!(
        "DeepL rate limited; retrying in {:.1}s (attempt {}/{})",
        wait.as_secs_f32(),
        attempt,
        RATE_LIMIT_MAX_RETRIES
    );
    sleep(wait).await;
    next_delay(delay)
}

pub(crate) fn next_delay(current: Duration) -> Duration {
    let next_secs = current
        .as_secs()
        .saturating_mul(2)
        .max(RATE_LIMIT_BASE_DELAY.as_secs());
    let next = Duration::from_secs(next_secs);
    if next > RATE_LIMIT_MAX_DELAY {
        RATE_LIMIT_MAX_DELAY
    } else {
        next
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.message.filter(|message| !message.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

/// Splits `text` into chunks of at most `max_chars` characters, breaking at
/// sentence boundaries where possible. A single sentence longer than the
/// limit is split hard.
pub(crate) fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(trimmed) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let sentence_len = sentence.chars().count();
        if sentence_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(hard_split(sentence, max_chars));
            continue;
        }
        if !current.is_empty() && current.chars().count() + sentence_len + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().map(|next| next.is_whitespace()).unwrap_or(true)
        {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current);
    }
    sentences
}

fn hard_split(sentence: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect())
        .collect()
}
