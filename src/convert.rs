use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::document::{Document, DocumentFormat};
use crate::error::ConvertError;

const CONVERTER_ENV: &str = "PDF_TRANSLATOR_CONVERTER";
const CONVERTER_CANDIDATES: [&str; 2] = ["soffice", "libreoffice"];

/// Picks the converter binary: explicit setting, then the
/// `PDF_TRANSLATOR_CONVERTER` environment variable, then the usual
/// LibreOffice names on PATH.
pub fn resolve_converter(configured: Option<&str>) -> Result<String, ConvertError> {
    if let Some(command) = configured_override(configured) {
        if command_exists(&command) {
            return Ok(command);
        }
        return Err(ConvertError::ToolUnavailable { tried: command });
    }
    for candidate in CONVERTER_CANDIDATES {
        if command_exists(candidate) {
            return Ok(candidate.to_string());
        }
    }
    Err(ConvertError::ToolUnavailable {
        tried: CONVERTER_CANDIDATES.join(", "),
    })
}

fn configured_override(configured: Option<&str>) -> Option<String> {
    if let Some(command) = configured {
        let command = command.trim();
        if !command.is_empty() {
            return Some(command.to_string());
        }
    }
    env::var(CONVERTER_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Runs a headless LibreOffice conversion of `input` into `target`,
/// writing into `out_dir`. LibreOffice occasionally exits zero without
/// producing anything, so the output file is checked as well.
pub fn convert_to(
    tool: &str,
    input: &Document,
    target: DocumentFormat,
    out_dir: &Path,
) -> Result<Document, ConvertError> {
    debug!(
        "running {} --convert-to {} on {}",
        tool,
        target.extension(),
        input.path.display()
    );
    let output = Command::new(tool)
        .arg("--headless")
        .arg("--convert-to")
        .arg(target.extension())
        .arg("--outdir")
        .arg(out_dir)
        .arg(&input.path)
        .output()
        .map_err(|source| ConvertError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::Failed {
            tool: tool.to_string(),
            input: input.path.clone(),
            format: target.extension(),
            stderr: stderr.trim().to_string(),
        });
    }

    let produced = expected_output(&input.path, target, out_dir);
    let non_empty = std::fs::metadata(&produced)
        .map(|meta| meta.len() > 0)
        .unwrap_or(false);
    if !non_empty {
        return Err(ConvertError::MissingOutput {
            tool: tool.to_string(),
            format: target.extension(),
            path: produced,
        });
    }

    info!(
        "converted {} to {}",
        input.path.display(),
        produced.display()
    );
    Ok(Document::new(produced, target))
}

fn expected_output(input: &Path, target: DocumentFormat, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{}.{}", stem, target.extension()))
}

pub(crate) fn command_exists(cmd: &str) -> bool {
    let path = Path::new(cmd);
    if path.components().count() > 1 {
        return path.is_file();
    }
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| dir.join(cmd).is_file())
}

#[cfg(test)]
mod tests {
    use super::{command_exists, expected_output, resolve_converter};
    use crate::document::DocumentFormat;
    use crate::error::ConvertError;
    use std::path::Path;

    #[test]
    fn output_path_swaps_the_extension() {
        let produced = expected_output(
            Path::new("/tmp/work/report.pdf"),
            DocumentFormat::Docx,
            Path::new("/tmp/out"),
        );
        assert_eq!(produced, Path::new("/tmp/out/report.docx"));
    }

    #[test]
    fn command_probe_finds_the_shell_but_not_nonsense() {
        assert!(command_exists("/bin/sh"));
        assert!(!command_exists("definitely-not-a-real-converter-xyz"));
    }

    #[test]
    fn configured_converter_must_exist() {
        let err = resolve_converter(Some("definitely-not-a-real-converter-xyz")).unwrap_err();
        assert!(matches!(err, ConvertError::ToolUnavailable { .. }));
    }
}
