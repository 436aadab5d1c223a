use axum::extract::Multipart;
use axum::http::StatusCode;
use tracing::{error, info};

use crate::ocr::OcrError;
use crate::pipeline;

use super::models::UploadResponse;
use super::state::ServerState;
use super::util::{save_upload, upload_filename};

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

impl From<OcrError> for ServerError {
    fn from(err: OcrError) -> Self {
        let status = if err.is_configuration() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub(crate) filename: String,
    pub(crate) bytes: Vec<u8>,
}

/// Pulls the `file` part out of the multipart body.
pub(crate) async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::bad_request(err.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ServerError::bad_request(err.body_text()))?;
        if filename.is_empty() {
            return Err(ServerError::bad_request("No selected file"));
        }
        return Ok(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Err(ServerError::bad_request("No file part"))
}

/// Saves the upload, then scans it against the current dictionary.
pub(crate) fn process_upload(
    state: &ServerState,
    file: UploadedFile,
) -> Result<UploadResponse, ServerError> {
    let filename = upload_filename(&file.filename, &file.bytes);
    let path = save_upload(&state.settings.upload_dir, &filename, &file.bytes)?;
    info!("saved upload to {}", path.display());

    let dictionary = state.dictionary();
    let output = pipeline::scan_image(&file.bytes, state.recognizer.as_ref(), &dictionary)
        .map_err(|err| {
            error!("error processing {}: {}", filename, err);
            ServerError::from(err)
        })?;

    Ok(UploadResponse {
        status: "success",
        extracted_text: output.extracted_text,
        detected_medicines: output.detected_medicines,
        detected_dosages: output.detected_dosages,
        filename,
    })
}
