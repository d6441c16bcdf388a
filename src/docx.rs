use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::deepl::Translate;
use crate::error::{DocxError, TranslateError};

/// WordprocessingML text run tag.
const RUN_TEXT_TAG: &[u8] = b"w:t";

#[derive(Debug, Default, Clone)]
pub struct RewriteStats {
    pub entries_rewritten: usize,
    pub runs_translated: usize,
    pub runs_reused: usize,
    pub runs_skipped: usize,
}

/// Rewrites a DOCX in memory: every `w:t` run in `word/*.xml` entries gets
/// its text translated; all other entries and markup are copied through
/// untouched.
pub async fn translate_docx<T: Translate>(
    bytes: &[u8],
    translator: &T,
) -> Result<(Vec<u8>, RewriteStats), TranslateError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(DocxError::from)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut cache = RunCache::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(DocxError::from)?;
        let name = file.name().to_string();
        let file_options = FileOptions::default().compression_method(file.compression());
        if file.is_dir() {
            writer
                .add_directory(name, file_options)
                .map_err(DocxError::from)?;
            continue;
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(DocxError::from)?;
        drop(file);

        let output = if is_translatable_entry(&name) {
            debug!("rewriting entry {}", name);
            cache.stats.entries_rewritten += 1;
            rewrite_runs(&data, &mut cache, translator).await?
        } else {
            data
        };

        writer
            .start_file(name, file_options)
            .map_err(DocxError::from)?;
        writer.write_all(&output).map_err(DocxError::from)?;
    }

    let bytes = writer
        .finish()
        .map_err(DocxError::from)?
        .into_inner();
    Ok((bytes, cache.stats))
}

/// Body, headers, footers, footnotes and comments all live under `word/`.
fn is_translatable_entry(name: &str) -> bool {
    name.starts_with("word/") && name.ends_with(".xml")
}

async fn rewrite_runs<T: Translate>(
    xml: &[u8],
    cache: &mut RunCache,
    translator: &T,
) -> Result<Vec<u8>, TranslateError> {
    let mut reader = Reader::from_reader(Cursor::new(xml));
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == RUN_TEXT_TAG {
                    in_run_text = true;
                }
                writer
                    .write_event(Event::Start(e.to_owned()))
                    .map_err(DocxError::from)?;
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == RUN_TEXT_TAG {
                    in_run_text = false;
                }
                writer
                    .write_event(Event::End(e.to_owned()))
                    .map_err(DocxError::from)?;
            }
            Ok(Event::Text(e)) => {
                if in_run_text {
                    let text = e.unescape().map_err(DocxError::from)?.into_owned();
                    let translated = cache.translate_run(&text, translator).await?;
                    writer
                        .write_event(Event::Text(BytesText::new(&translated)))
                        .map_err(DocxError::from)?;
                } else {
                    writer
                        .write_event(Event::Text(e))
                        .map_err(DocxError::from)?;
                }
            }
            Ok(Event::CData(e)) => {
                if in_run_text {
                    let raw = e.into_inner();
                    let text = String::from_utf8_lossy(raw.as_ref()).into_owned();
                    let translated = cache.translate_run(&text, translator).await?;
                    writer
                        .write_event(Event::Text(BytesText::new(&translated)))
                        .map_err(DocxError::from)?;
                } else {
                    writer
                        .write_event(Event::CData(e))
                        .map_err(DocxError::from)?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(event) => {
                writer.write_event(event).map_err(DocxError::from)?;
            }
            Err(err) => return Err(DocxError::Xml(err).into()),
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}

/// Per-document memo of run translations. Repeated runs (page headers,
/// table labels) are translated once.
struct RunCache {
    map: HashMap<String, String>,
    stats: RewriteStats,
}

impl RunCache {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
            stats: RewriteStats::default(),
        }
    }

    async fn translate_run<T: Translate>(
        &mut self,
        text: &str,
        translator: &T,
    ) -> Result<String, TranslateError> {
        let Some((start, end)) = core_bounds(text) else {
            self.stats.runs_skipped += 1;
            return Ok(text.to_string());
        };
        let core = &text[start..end];
        if is_numeric_like(core) {
            self.stats.runs_skipped += 1;
            return Ok(text.to_string());
        }
        if let Some(existing) = self.map.get(core) {
            self.stats.runs_reused += 1;
            return Ok(format!("{}{}{}", &text[..start], existing, &text[end..]));
        }
        let translated = translator.translate(core).await?;
        self.stats.runs_translated += 1;
        self.map.insert(core.to_string(), translated.clone());
        Ok(format!("{}{}{}", &text[..start], translated, &text[end..]))
    }
}

/// Byte bounds of the non-whitespace core of a run, so `xml:space`
/// padding survives translation.
fn core_bounds(text: &str) -> Option<(usize, usize)> {
    let mut start = None;
    let mut end = None;
    for (idx, ch) in text.char_indices() {
        if !ch.is_whitespace() {
            start = Some(idx);
            break;
        }
    }
    for (idx, ch) in text.char_indices().rev() {
        if !ch.is_whitespace() {
            end = Some(idx + ch.len_utf8());
            break;
        }
    }
    match (start, end) {
        (Some(s), Some(e)) if s < e => Some((s, e)),
        _ => None,
    }
}

/// Page numbers and figure counters pass through untranslated.
fn is_numeric_like(value: &str) -> bool {
    let mut digits = 0usize;
    let mut letters = 0usize;
    let mut others = 0usize;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits += 1;
        } else if ch.is_alphabetic() {
            letters += 1;
        } else if !ch.is_whitespace() {
            others += 1;
        }
    }
    if letters > 0 {
        return false;
    }
    digits > 0 && (digits as f32 / (digits + others).max(1) as f32) >= 0.6
}
