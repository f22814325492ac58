use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::Multipart;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use super::upload::Upload;
use crate::serve::error::ApiError;
use crate::{StripOptions, StripResult, StripStats};

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub code: String,
    /// Language id or alias; empty or "auto" detects it
    #[serde(default)]
    pub language: String,
    #[serde(default = "default_preserve_structure")]
    pub preserve_structure: bool,
}

fn default_preserve_structure() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub processed_code: String,
    pub original_lines: usize,
    pub processed_lines: usize,
    pub detected_language: &'static str,
    pub stats: StripStats,
    /// Seconds
    pub processing_time: f64,
}

impl ProcessResponse {
    fn new(result: StripResult, elapsed: Duration) -> Self {
        Self {
            success: true,
            original_lines: result.stats.original_lines,
            processed_lines: result.stats.processed_lines,
            processed_code: result.code,
            detected_language: result.language,
            stats: result.stats,
            processing_time: (elapsed.as_secs_f64() * 10_000.0).round() / 10_000.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub filename: String,
    #[serde(flatten)]
    pub result: ProcessResponse,
}

/// Run the engine on the blocking pool.
pub(super) async fn strip_blocking(
    code: String,
    language: String,
    options: StripOptions,
) -> Result<ProcessResponse, ApiError> {
    let started = Instant::now();
    let result =
        tokio::task::spawn_blocking(move || crate::remove_comments(&code, &language, options))
            .await??;
    Ok(ProcessResponse::new(result, started.elapsed()))
}

/// POST /api/process
pub async fn process(
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(req) = payload?;
    let options = StripOptions {
        preserve_structure: req.preserve_structure,
    };

    let response = strip_blocking(req.code, req.language, options).await?;
    tracing::info!(
        language = response.detected_language,
        removed = response.stats.removed,
        "processed snippet"
    );
    Ok(Json(response))
}

/// POST /api/process-file: one uploaded file
pub async fn process_file(multipart: Multipart) -> Result<Json<FileResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let options = StripOptions {
        preserve_structure: upload.preserve_structure()?,
    };
    let language = upload.field("language").map(str::to_string);

    let Some(file) = upload.files.into_iter().next() else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    let code = file.text()?;
    let language = language.unwrap_or_else(|| file.language_hint());
    let result = strip_blocking(code, language, options).await?;

    tracing::info!(
        filename = %file.filename,
        language = result.detected_language,
        removed = result.stats.removed,
        "processed upload"
    );
    Ok(Json(FileResponse {
        filename: file.filename,
        result,
    }))
}
