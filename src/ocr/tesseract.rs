use image::DynamicImage;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

use super::{OcrError, Recognizer};
use crate::settings::Settings;

const TESSERACT_CMD_ENV: &str = "TESSERACT_CMD";

/// Runs the `tesseract` binary on a temporary PNG and reads plain text from
/// its stdout.
#[derive(Debug, Clone)]
pub struct Tesseract {
    command: PathBuf,
    languages: String,
}

impl Tesseract {
    pub fn new(command: impl Into<PathBuf>, languages: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            languages: languages.into(),
        }
    }

    /// Picks the binary from settings, then `TESSERACT_CMD`, then the first
    /// existing candidate install path, falling back to `tesseract` on PATH.
    pub fn from_settings(settings: &Settings) -> Self {
        let command = resolve_command(
            settings.tesseract_cmd.as_deref(),
            std::env::var(TESSERACT_CMD_ENV).ok().as_deref(),
            &settings.tesseract_candidates,
        );
        Self::new(command, settings.ocr_languages.clone())
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    pub fn list_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = self.spawn(Command::new(&self.command).arg("--list-langs"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::recognition(format!(
                "tesseract --list-langs failed: {}",
                stderr.trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut langs = Vec::new();
        // First line is the "List of available languages" header.
        for line in stdout.lines().skip(1) {
            let value = line.trim();
            if !value.is_empty() {
                langs.push(value.to_string());
            }
        }
        Ok(langs)
    }

    fn run_text(&self, path: &Path) -> Result<String, OcrError> {
        let output = self.spawn(
            Command::new(&self.command)
                .arg(path)
                .arg("stdout")
                .arg("-l")
                .arg(&self.languages),
        )?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::recognition(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn spawn(&self, command: &mut Command) -> Result<Output, OcrError> {
        command.output().map_err(|err| match err.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => OcrError::EngineUnavailable {
                command: self.command.display().to_string(),
            },
            _ => OcrError::recognition(format!("failed to run tesseract: {}", err)),
        })
    }
}

/// Writes `image` to a flushed temporary PNG that lives as long as the handle.
fn write_temp_png(image: &DynamicImage) -> Result<tempfile::NamedTempFile, OcrError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("medscan-")
        .suffix(".png")
        .tempfile()
        .map_err(|err| OcrError::recognition(format!("failed to create temp file: {}", err)))?;
    image
        .write_to(&mut tmp, image::ImageFormat::Png)
        .map_err(|err| OcrError::recognition(format!("failed to write temp image: {}", err)))?;
    tmp.flush()
        .map_err(|err| OcrError::recognition(format!("failed to flush temp image: {}", err)))?;
    Ok(tmp)
}

impl Recognizer for Tesseract {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let tmp = write_temp_png(image)?;

        debug!(
            "running {} on {} ({})",
            self.command.display(),
            tmp.path().display(),
            self.languages
        );
        self.run_text(tmp.path())
    }
}

fn resolve_command(
    configured: Option<&str>,
    from_env: Option<&str>,
    candidates: &[String],
) -> PathBuf {
    for value in [configured, from_env].into_iter().flatten() {
        let value = value.trim();
        if !value.is_empty() {
            return PathBuf::from(value);
        }
    }
    for candidate in candidates {
        let path = Path::new(candidate);
        if path.exists() {
            info!("tesseract found at: {}", path.display());
            return path.to_path_buf();
        }
    }
    info!("tesseract not found in common directories; assuming it is on PATH");
    PathBuf::from("tesseract")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_png_is_complete_on_disk() {
        let image = DynamicImage::new_luma8(7, 3);
        let tmp = write_temp_png(&image).expect("temp png");
        let decoded = image::open(tmp.path()).expect("decode temp png");
        assert_eq!((decoded.width(), decoded.height()), (7, 3));
    }

    #[test]
    fn configured_command_wins() {
        let candidates = vec!["/definitely/not/here".to_string()];
        assert_eq!(
            resolve_command(Some("/opt/tess"), Some("/env/tess"), &candidates),
            PathBuf::from("/opt/tess")
        );
        assert_eq!(
            resolve_command(Some("  "), Some("/env/tess"), &candidates),
            PathBuf::from("/env/tess")
        );
    }

    #[test]
    fn first_existing_candidate_is_used() {
        let dir = tempdir().expect("tempdir");
        let present = dir.path().join("tesseract.exe");
        std::fs::write(&present, b"").expect("write candidate");
        let candidates = vec![
            dir.path().join("missing.exe").to_string_lossy().to_string(),
            present.to_string_lossy().to_string(),
        ];
        assert_eq!(resolve_command(None, None, &candidates), present);
    }

    #[test]
    fn falls_back_to_path_lookup() {
        assert_eq!(resolve_command(None, None, &[]), PathBuf::from("tesseract"));
    }

    #[test]
    fn missing_binary_is_a_configuration_error() {
        let dir = tempdir().expect("tempdir");
        let engine = Tesseract::new(dir.path().join("no-such-tesseract"), "eng");
        let image = DynamicImage::new_luma8(4, 4);
        let err = engine.recognize(&image).expect_err("binary is missing");
        assert!(matches!(err, OcrError::EngineUnavailable { .. }));
        assert!(err.to_string().contains("Tesseract-OCR not found"));
    }
}
