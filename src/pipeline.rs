use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use tracing::{info, warn};

use crate::convert;
use crate::deepl::DeeplClient;
use crate::document::{self, Document, DocumentFormat};
use crate::docx;
use crate::error::{ConvertError, TranslateError};
use crate::settings::Settings;

pub struct PipelineOptions {
    pub output: Option<PathBuf>,
    pub keep_intermediate: bool,
}

/// Runs the three stages in order: PDF → DOCX, run-by-run translation,
/// DOCX → PDF. Intermediate files live in a temp dir that is dropped at
/// the end of the run.
pub async fn execute(
    input: &Path,
    target_code: &str,
    client: &DeeplClient,
    settings: &Settings,
    options: &PipelineOptions,
) -> Result<PathBuf, TranslateError> {
    if !input.is_file() {
        return Err(TranslateError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    if document::sniff_format(&read_head(input)?) != Some(DocumentFormat::Pdf) {
        return Err(TranslateError::NotAPdf {
            path: input.to_path_buf(),
        });
    }
    let source = Document::new(input.to_path_buf(), DocumentFormat::Pdf);

    let tool = convert::resolve_converter(settings.converter_command.as_deref())?;
    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, target_code));

    let work_dir = tempdir()?;

    info!("converting {} to docx", source.path.display());
    let source_docx = convert::convert_to(&tool, &source, DocumentFormat::Docx, work_dir.path())?;

    info!("translating document text");
    let docx_bytes = fs::read(&source_docx.path)?;
    let (translated_bytes, stats) = docx::translate_docx(&docx_bytes, client).await?;
    info!(
        "rewrote {} entries ({} runs translated, {} reused, {} skipped)",
        stats.entries_rewritten, stats.runs_translated, stats.runs_reused, stats.runs_skipped
    );

    let translated = Document::new(
        work_dir.path().join("translated.docx"),
        DocumentFormat::Docx,
    );
    fs::write(&translated.path, &translated_bytes)?;

    if options.keep_intermediate {
        let kept = output_path.with_extension("docx");
        fs::copy(&translated.path, &kept)?;
        info!("kept intermediate docx at {}", kept.display());
    }

    info!("converting translated docx to pdf");
    let produced =
        match convert::convert_to(&tool, &translated, DocumentFormat::Pdf, work_dir.path()) {
            Ok(document) => document,
            Err(err) => {
                // the translated docx survives the failed conversion
                let salvage = output_path.with_extension("docx");
                if fs::copy(&translated.path, &salvage).is_ok() {
                    warn!(
                        "pdf conversion failed; translated docx saved to {}",
                        salvage.display()
                    );
                }
                return Err(err.into());
            }
        };

    if document::sniff_format(&read_head(&produced.path)?) != Some(DocumentFormat::Pdf) {
        return Err(ConvertError::MissingOutput {
            tool,
            format: "pdf",
            path: produced.path,
        }
        .into());
    }

    move_into_place(&produced.path, &output_path)?;
    info!("translated pdf written to {}", output_path.display());
    Ok(output_path)
}

/// `sample.pdf` translated to `SK` lands at `sample_SK.pdf` in the
/// current directory unless `--output` says otherwise.
pub(crate) fn default_output_path(input: &Path, target_code: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "translated".to_string());
    PathBuf::from(format!("{}_{}.pdf", stem, target_code))
}

fn read_head(path: &Path) -> Result<Vec<u8>, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut head = Vec::new();
    file.take(8192).read_to_end(&mut head)?;
    Ok(head)
}

fn move_into_place(from: &Path, to: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    // rename fails across filesystems; the temp dir may be on another mount
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{default_output_path, move_into_place, read_head};
    use std::fs;
    use std::path::Path;

    #[test]
    fn default_output_name_carries_the_target_code() {
        assert_eq!(
            default_output_path(Path::new("sample.pdf"), "SK"),
            Path::new("sample_SK.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("docs/report.pdf"), "DE"),
            Path::new("report_DE.pdf")
        );
    }

    #[test]
    fn head_read_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        fs::write(&path, vec![7u8; 20_000]).unwrap();
        let head = read_head(&path).unwrap();
        assert_eq!(head.len(), 8192);
    }

    #[test]
    fn move_into_place_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.pdf");
        fs::write(&from, b"%PDF-1.4").unwrap();
        let to = dir.path().join("nested/out/b.pdf");
        move_into_place(&from, &to).unwrap();
        assert_eq!(fs::read(&to).unwrap(), b"%PDF-1.4");
    }
}
