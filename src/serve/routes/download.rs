use axum::Form;
use axum::extract::rejection::FormRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::process::strip_blocking;
use super::upload::parse_flag;
use crate::StripOptions;
use crate::profile::{self, LanguageProfile};
use crate::serve::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    pub filename: Option<String>,
    pub preserve_structure: Option<String>,
}

/// POST /remove_comments: stripped code as a file download
pub async fn download(
    form: Result<Form<DownloadForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    let preserve_structure = form
        .preserve_structure
        .as_deref()
        .map(parse_flag)
        .transpose()?
        .unwrap_or(true);

    let response = strip_blocking(
        form.code,
        form.language,
        StripOptions { preserve_structure },
    )
    .await?;
    let profile = profile::profile_for(response.detected_language)?;
    let filename = attachment_name(form.filename.as_deref(), profile);

    tracing::info!(%filename, language = profile.id, "prepared download");

    let headers = [
        (header::CONTENT_TYPE, format!("{}; charset=utf-8", profile.mime)),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, response.processed_code).into_response())
}

/// File name for the attachment: the base name the client sent, made safe
/// for a quoted header value, or `processed_code.<ext>`.
fn attachment_name(requested: Option<&str>, profile: &LanguageProfile) -> String {
    let base = requested
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();
    let clean: String = base
        .chars()
        .map(|c| match c {
            '"' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if clean.trim().is_empty() {
        format!("processed_code.{}", profile.default_extension())
    } else {
        clean.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_uses_language_extension() {
        let rust = profile::profile_for("rust").unwrap();
        assert_eq!(attachment_name(None, rust), "processed_code.rs");
        assert_eq!(attachment_name(Some("  "), rust), "processed_code.rs");
    }

    #[test]
    fn upload_names_lose_directories_and_quotes() {
        let py = profile::profile_for("python").unwrap();
        assert_eq!(attachment_name(Some("src/app.py"), py), "app.py");
        assert_eq!(attachment_name(Some("C:\\work\\a\"b.py"), py), "a_b.py");
        assert_eq!(attachment_name(Some("naïve.py"), py), "na_ve.py");
    }
}
