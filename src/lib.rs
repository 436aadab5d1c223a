use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

pub mod alert;
pub mod dictionary;
pub mod dosage;
pub mod extract;
pub mod logging;
pub mod ocr;
pub mod pipeline;
pub mod server;
pub mod settings;
pub mod similarity;
mod stop_words;
mod test_util;

pub use dictionary::MedicineDictionary;
pub use extract::{ExtractionResult, analyze_text, extract_medicines};
pub use ocr::{OcrError, Recognizer, Tesseract};
pub use pipeline::{ScanOutput, scan_image};
pub use stop_words::is_stop_word;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub data: Option<String>,
    pub medicines: Option<String>,
    pub settings_path: Option<String>,
    pub show_medicines: bool,
    pub show_ocr_languages: bool,
}

/// Settings with the command-line overrides from `config` applied.
pub fn resolve_settings(config: &Config) -> Result<settings::Settings> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(path) = config.medicines.as_deref() {
        if !path.trim().is_empty() {
            settings.medicines_path = PathBuf::from(path);
        }
    }
    Ok(settings)
}

/// Scans the `--data` image, or extracts from `input` text when no image is
/// given, and renders the result as pretty JSON.
pub fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings = resolve_settings(&config)?;

    if config.show_ocr_languages {
        let engine = Tesseract::from_settings(&settings);
        return Ok(engine.list_languages()?.join("\n"));
    }

    let dictionary = MedicineDictionary::load(&settings.medicines_path);
    if config.show_medicines {
        return Ok(dictionary.names().join("\n"));
    }

    if let Some(path) = config.data.as_deref() {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read image: {}", path))?;
        let engine = Tesseract::from_settings(&settings);
        let output = scan_image(&bytes, &engine, &dictionary)?;
        return serde_json::to_string_pretty(&output).with_context(|| "failed to render output");
    }

    let input = input.unwrap_or_default();
    if input.trim().is_empty() {
        return Err(anyhow!("stdin is empty"));
    }
    let result = analyze_text(&input, &dictionary);
    serde_json::to_string_pretty(&result).with_context(|| "failed to render output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn text_mode_renders_extraction_json() {
        with_temp_home(|home| {
            let medicines = home.join("medicines.csv");
            std::fs::write(&medicines, "Lisinopril\nFolic Acid\n").expect("write medicines");
            let config = Config {
                medicines: Some(medicines.to_string_lossy().to_string()),
                ..Config::default()
            };
            let output = run(config, Some("LISINOPRIL 10 mg, folic acid".to_string()))
                .expect("run");
            let value: serde_json::Value = serde_json::from_str(&output).expect("json");
            assert_eq!(
                value["detected_medicines"],
                serde_json::json!(["Folic Acid", "Lisinopril"])
            );
            assert_eq!(value["detected_dosages"], serde_json::json!(["10 mg"]));
        });
    }

    #[test]
    fn show_medicines_lists_sorted_entries() {
        with_temp_home(|home| {
            let medicines = home.join("medicines.csv");
            std::fs::write(&medicines, "Warfarin\nAtorvastatin\n").expect("write medicines");
            let config = Config {
                medicines: Some(medicines.to_string_lossy().to_string()),
                show_medicines: true,
                ..Config::default()
            };
            assert_eq!(run(config, None).expect("run"), "atorvastatin\nwarfarin");
        });
    }

    #[test]
    fn empty_input_is_rejected() {
        with_temp_home(|home| {
            let config = Config {
                medicines: Some(home.join("none.csv").to_string_lossy().to_string()),
                ..Config::default()
            };
            let err = run(config, Some("  \n".to_string())).expect_err("empty");
            assert_eq!(err.to_string(), "stdin is empty");
        });
    }
}
