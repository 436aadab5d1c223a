use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::alert::{self, AlertRequest};
use crate::settings;

use super::models::{AlertResponse, ErrorResponse, ReloadResponse, UploadResponse};
use super::state::ServerState;
use super::upload::{ServerError, process_upload, read_file_field};

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let state = Arc::new(ServerState::from_settings(settings));
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload-prescription", post(upload_prescription))
        .route("/send-alert", post(send_alert))
        .route("/reload-medicines", post(reload_medicines))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

fn api_error(err: ServerError) -> ApiError {
    (err.status, Json(ErrorResponse::new(err.message)))
}

fn task_failed(err: tokio::task::JoinError) -> ApiError {
    api_error(ServerError::internal(format!("server task failed: {}", err)))
}

async fn upload_prescription(
    State(state): State<Arc<ServerState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let file = read_file_field(&mut multipart).await.map_err(api_error)?;
    let result = tokio::task::spawn_blocking(move || process_upload(state.as_ref(), file))
        .await
        .map_err(task_failed)?;
    result.map(Json).map_err(api_error)
}

async fn send_alert(
    State(state): State<Arc<ServerState>>,
    payload: Option<Json<AlertRequest>>,
) -> Result<Json<AlertResponse>, ApiError> {
    let Some(Json(payload)) = payload.filter(|Json(payload)| !payload.is_empty()) else {
        return Err(api_error(ServerError::bad_request("No data provided")));
    };
    let Some(missed) = payload.validate() else {
        return Err(api_error(ServerError::bad_request("Missing required fields")));
    };

    let Some(sender) = state.alert_sender.clone() else {
        warn!("email credentials not configured; skipping email send");
        return Ok(Json(AlertResponse {
            status: "sent",
            simulated: Some(true),
        }));
    };

    let result = tokio::task::spawn_blocking(move || {
        alert::send_missed_dose_alert(sender.mailer.as_ref(), &sender.from, &missed)
    })
    .await
    .map_err(task_failed)?;

    match result {
        Ok(()) => Ok(Json(AlertResponse {
            status: "sent",
            simulated: None,
        })),
        Err(err) => {
            error!("error sending email: {:#}", err);
            Err(api_error(ServerError::from(err)))
        }
    }
}

async fn reload_medicines(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let current = state.dictionary();
    let reloaded = tokio::task::spawn_blocking(move || current.reload())
        .await
        .map_err(task_failed)?;
    let count = state.replace_dictionary(reloaded);
    info!("medicine dictionary reloaded with {} entries", count);
    Ok(Json(ReloadResponse {
        status: "ok",
        medicines: count,
    }))
}
