use serde::Serialize;
use tracing::debug;

use crate::dictionary::MedicineDictionary;
use crate::extract;
use crate::ocr::{self, OcrError, Recognizer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutput {
    pub extracted_text: String,
    pub detected_medicines: Vec<String>,
    pub detected_dosages: Vec<String>,
}

/// Image bytes in, recognized text plus detected medicines and dosages out.
pub fn scan_image(
    image_bytes: &[u8],
    recognizer: &dyn Recognizer,
    dictionary: &MedicineDictionary,
) -> Result<ScanOutput, OcrError> {
    let text = ocr::recognize_bytes(image_bytes, recognizer)?;
    debug!("recognized {} chars", text.chars().count());
    let result = extract::analyze_text(&text, dictionary);
    Ok(ScanOutput {
        extracted_text: text.trim().to_string(),
        detected_medicines: result.detected_medicines,
        detected_dosages: result.detected_dosages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::png_bytes;
    use image::DynamicImage;
    use std::sync::Mutex;

    struct FixedText {
        text: String,
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl Recognizer for FixedText {
        fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
            self.seen
                .lock()
                .expect("seen lock")
                .push((image.width(), image.height()));
            Ok(self.text.clone())
        }
    }

    struct Failing;

    impl Recognizer for Failing {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Err(OcrError::recognition("engine crashed"))
        }
    }

    #[test]
    fn scan_runs_preprocessing_then_extraction() {
        let recognizer = FixedText {
            text: "  Rx: Amoxicilin 500 mg\nTake 1 tablet daily  \n".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let dictionary = MedicineDictionary::from_names(["Amoxicillin"]);
        let bytes = png_bytes(&DynamicImage::new_rgb8(200, 50));

        let output = scan_image(&bytes, &recognizer, &dictionary).expect("scan");
        assert_eq!(
            output.extracted_text,
            "Rx: Amoxicilin 500 mg\nTake 1 tablet daily"
        );
        assert_eq!(output.detected_medicines, vec!["Amoxicillin"]);
        assert_eq!(output.detected_dosages, vec!["500 mg"]);
        assert_eq!(*recognizer.seen.lock().expect("seen lock"), vec![(400, 100)]);
    }

    #[test]
    fn undecodable_bytes_are_a_recognition_error() {
        let dictionary = MedicineDictionary::default();
        let err = scan_image(b"not an image", &Failing, &dictionary).expect_err("bad image");
        assert!(!err.is_configuration());
        assert!(err.to_string().starts_with("OCR processing failed"));
    }

    #[test]
    fn engine_failures_propagate() {
        let dictionary = MedicineDictionary::default();
        let bytes = png_bytes(&DynamicImage::new_luma8(10, 10));
        let err = scan_image(&bytes, &Failing, &dictionary).expect_err("engine failed");
        assert_eq!(err.to_string(), "OCR processing failed: engine crashed");
    }
}
