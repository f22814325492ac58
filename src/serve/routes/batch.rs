use std::collections::BTreeMap;

use axum::Json;
use axum::extract::Multipart;
use serde::Serialize;

use super::process::{ProcessResponse, strip_blocking};
use super::upload::Upload;
use crate::StripOptions;
use crate::serve::error::ApiError;

/// Per-file result of a batch: the usual response or the error for that file.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileOutcome {
    Processed(ProcessResponse),
    Failed { error: String },
}

/// POST /api/process-multiple
///
/// Files are processed concurrently. A file that fails is reported under its
/// name and does not affect the others.
pub async fn process_multiple(
    multipart: Multipart,
) -> Result<Json<BTreeMap<String, FileOutcome>>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let options = StripOptions {
        preserve_structure: upload.preserve_structure()?,
    };
    let language = upload.field("language").map(str::to_string);

    if upload.files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let jobs = upload.files.into_iter().map(|file| {
        let language = language.clone();
        async move {
            let outcome = match file.text() {
                Ok(code) => {
                    let language = language.unwrap_or_else(|| file.language_hint());
                    match strip_blocking(code, language, options).await {
                        Ok(response) => FileOutcome::Processed(response),
                        Err(err) => FileOutcome::Failed {
                            error: err.public_message(),
                        },
                    }
                }
                Err(err) => FileOutcome::Failed {
                    error: err.public_message(),
                },
            };
            (file.filename, outcome)
        }
    });

    let results: BTreeMap<String, FileOutcome> =
        futures::future::join_all(jobs).await.into_iter().collect();

    let failed = results
        .values()
        .filter(|outcome| matches!(outcome, FileOutcome::Failed { .. }))
        .count();
    tracing::info!(files = results.len(), failed, "processed batch");

    Ok(Json(results))
}
