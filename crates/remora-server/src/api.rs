//! Route handlers.
//!
//! Response shapes mirror the converter's contract: conversion endpoints answer with
//! `{success, image_data, filename, message}` on success, `{error}` with 400 for bad
//! requests, and `{success: false, error}` with 500 when even the fallback could not
//! produce an image.

use std::path::Path;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing mermaid_code in request")]
    MissingCode,

    #[error("No file uploaded")]
    NoFile,

    #[error("File must have .mmd extension")]
    WrongExtension,

    #[error("Malformed upload: {0}")]
    Multipart(String),

    #[error("{0}")]
    Conversion(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingCode | Self::NoFile | Self::WrongExtension | Self::Multipart(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            Self::Conversion(message) => {
                tracing::error!(error = %message, "conversion failed without fallback");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": message })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertRequest {
    pub mermaid_code: Option<String>,
    pub config: Option<Value>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub image_data: String,
    pub filename: String,
    pub message: String,
}

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "mermaid_cli_available": state.converter.is_available(),
    }))
}

pub async fn check_dependencies(State(state): State<AppState>) -> Json<Value> {
    let converter = state.converter.clone();
    let dependencies_ok = tokio::task::spawn_blocking(move || converter.check_dependencies())
        .await
        .unwrap_or(false);
    Json(json!({
        "dependencies_ok": dependencies_ok,
        "mermaid_cli": state.converter.active_candidate().map(|c| c.label()),
    }))
}

pub async fn convert(
    State(state): State<AppState>,
    Json(req): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let code = req
        .mermaid_code
        .filter(|code| !code.trim().is_empty())
        .ok_or(ApiError::MissingCode)?;
    let filename = normalize_png_name(req.filename.as_deref().unwrap_or("diagram.png"));
    Ok(Json(
        convert_source(&state, code, req.config, filename).await?,
    ))
}

pub async fn convert_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut config_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Multipart(err.to_string()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::Multipart(err.to_string()))?;
                upload = Some((name, data.to_vec()));
            }
            Some("config") => {
                config_text = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (name, data) = upload.ok_or(ApiError::NoFile)?;
    // Malformed config JSON is silently ignored, matching the JSON endpoint's
    // availability-first posture.
    let config = config_text.and_then(|text| serde_json::from_str(&text).ok());
    Ok(Json(convert_upload(&state, &name, data, config).await?))
}

pub async fn examples() -> Json<Value> {
    let mut map = serde_json::Map::new();
    for example in remora::samples::examples() {
        map.insert(
            example.key.to_string(),
            json!({ "name": example.name, "code": example.code }),
        );
    }
    Json(Value::Object(map))
}

/// Converts raw diagram source and returns the base64-encoded image.
///
/// The output file gets a uuid-suffixed server-side name so concurrent requests with
/// identical caller-supplied filenames cannot clobber each other; the caller-facing
/// `filename` field still reflects the requested name.
pub async fn convert_source(
    state: &AppState,
    code: String,
    config: Option<Value>,
    filename: String,
) -> Result<ConvertResponse, ApiError> {
    let output = state.output_dir.join(unique_output_name(&filename));
    let converter = state.converter.clone();

    let result = tokio::task::spawn_blocking(move || {
        let conversion = converter.convert(&code, &output, config.as_ref())?;
        let bytes = std::fs::read(&conversion.output)?;
        let _ = std::fs::remove_file(&conversion.output);
        Ok::<_, remora::Error>((conversion, bytes))
    })
    .await
    .map_err(|err| ApiError::Conversion(format!("conversion task panicked: {err}")))?;

    match result {
        Ok((conversion, bytes)) => Ok(ConvertResponse {
            success: true,
            image_data: BASE64.encode(&bytes),
            filename,
            message: if conversion.degraded {
                "Conversion successful (placeholder image; Mermaid CLI unavailable)".to_string()
            } else {
                "Conversion successful".to_string()
            },
        }),
        Err(err) => Err(ApiError::Conversion(err.to_string())),
    }
}

/// Saves an uploaded `.mmd` file, converts it, and cleans both files up afterwards.
pub async fn convert_upload(
    state: &AppState,
    original_name: &str,
    data: Vec<u8>,
    config: Option<Value>,
) -> Result<ConvertResponse, ApiError> {
    if original_name.is_empty() {
        return Err(ApiError::NoFile);
    }
    if !original_name.to_ascii_lowercase().ends_with(".mmd") {
        return Err(ApiError::WrongExtension);
    }

    let safe = sanitize_filename(original_name);
    let stem = Path::new(&safe)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("diagram")
        .to_string();
    let upload_path = state.upload_dir.join(format!("{}-{safe}", Uuid::new_v4()));
    let output = state.output_dir.join(format!("{stem}-{}.png", Uuid::new_v4()));
    let converter = state.converter.clone();

    let result = tokio::task::spawn_blocking(move || {
        std::fs::write(&upload_path, &data)?;
        let outcome = converter.convert_file(&upload_path, Some(&output), config.as_ref());
        let _ = std::fs::remove_file(&upload_path);
        let conversion = outcome?;
        let bytes = std::fs::read(&conversion.output)?;
        let _ = std::fs::remove_file(&conversion.output);
        Ok::<_, remora::Error>((conversion, bytes))
    })
    .await
    .map_err(|err| ApiError::Conversion(format!("conversion task panicked: {err}")))?;

    match result {
        Ok((conversion, bytes)) => Ok(ConvertResponse {
            success: true,
            image_data: BASE64.encode(&bytes),
            filename: format!("{stem}.png"),
            message: if conversion.degraded {
                "File conversion successful (placeholder image; Mermaid CLI unavailable)"
                    .to_string()
            } else {
                "File conversion successful".to_string()
            },
        }),
        Err(err) => Err(ApiError::Conversion(err.to_string())),
    }
}

/// Strips path components and hostile characters from a caller-supplied filename.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "diagram".to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn normalize_png_name(name: &str) -> String {
    let safe = sanitize_filename(name);
    if safe.to_ascii_lowercase().ends_with(".png") {
        safe
    } else {
        format!("{safe}.png")
    }
}

fn unique_output_name(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("diagram");
    format!("{stem}-{}.png", Uuid::new_v4())
}
