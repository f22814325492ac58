use axum::Json;
use axum::extract::Multipart;
use serde::Serialize;

use super::process::strip_blocking;
use super::upload::Upload;
use crate::StripOptions;
use crate::serve::error::ApiError;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub language: &'static str,
    /// Lines that contained at least one comment
    pub comment_lines: usize,
    pub removed: usize,
    /// Bytes saved, e.g. `"12.5%"`
    pub estimated_reduction: String,
}

/// POST /api/analyze: what stripping would do, without the code
pub async fn analyze(multipart: Multipart) -> Result<Json<AnalyzeResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let language = upload.field("language").map(str::to_string);

    let (code, hint) = match (upload.fields.get("code"), upload.files.first()) {
        (Some(code), _) => (code.clone(), String::new()),
        (None, Some(file)) => (file.text()?, file.language_hint()),
        (None, None) => (String::new(), String::new()),
    };

    let response = strip_blocking(
        code,
        language.unwrap_or(hint),
        StripOptions::default(),
    )
    .await?;

    let stats = &response.stats;
    Ok(Json(AnalyzeResponse {
        language: response.detected_language,
        comment_lines: stats.lines_cleared + stats.lines_trimmed,
        removed: stats.removed,
        estimated_reduction: format!("{}%", stats.compression_ratio),
    }))
}
