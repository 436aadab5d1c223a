use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    pub(crate) status: &'static str,
    pub(crate) extracted_text: String,
    pub(crate) detected_medicines: Vec<String>,
    pub(crate) detected_dosages: Vec<String>,
    pub(crate) filename: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AlertResponse {
    pub(crate) status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) simulated: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReloadResponse {
    pub(crate) status: &'static str,
    pub(crate) medicines: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) status: &'static str,
    pub(crate) message: String,
}

impl ErrorResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
