mod preprocess;
mod tesseract;

use image::DynamicImage;
use thiserror::Error;

pub use preprocess::{BINARIZE_THRESHOLD, UPSCALE_BELOW_WIDTH, UPSCALE_FACTOR, preprocess};
pub use tesseract::Tesseract;

#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine binary could not be started at all.
    #[error("Tesseract-OCR not found. Please install it and add to PATH. (tried: {command})")]
    EngineUnavailable { command: String },

    #[error("OCR processing failed: {0}")]
    Recognition(String),
}

impl OcrError {
    pub fn recognition(message: impl Into<String>) -> Self {
        OcrError::Recognition(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, OcrError::EngineUnavailable { .. })
    }
}

/// Text recognition over an already preprocessed image.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Decodes `image_bytes`, preprocesses the bitmap and recognizes its text.
pub fn recognize_bytes(image_bytes: &[u8], recognizer: &dyn Recognizer) -> Result<String, OcrError> {
    let image = image::load_from_memory(image_bytes)
        .map_err(|err| OcrError::recognition(format!("failed to decode image: {}", err)))?;
    let processed = preprocess(&image);
    recognizer.recognize(&processed)
}
