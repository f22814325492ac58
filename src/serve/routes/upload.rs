//! Reading multipart bodies into files and plain fields.

use std::collections::HashMap;
use std::path::Path;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::detect;
use crate::serve::error::ApiError;

/// A multipart request split into uploaded files and text fields.
#[derive(Debug, Default)]
pub struct Upload {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload = Upload::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await?;
                    upload.files.push(UploadedFile { filename, bytes });
                }
                None => {
                    let text = field.text().await?;
                    upload.fields.insert(name, text);
                }
            }
        }

        Ok(upload)
    }

    /// A text field, ignoring blank values.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// The `preserve_structure` flag, on unless the client turns it off.
    pub fn preserve_structure(&self) -> Result<bool, ApiError> {
        self.field("preserve_structure")
            .map(parse_flag)
            .transpose()
            .map(|flag| flag.unwrap_or(true))
    }
}

impl UploadedFile {
    pub fn text(&self) -> Result<String, ApiError> {
        String::from_utf8(self.bytes.to_vec()).map_err(|_| {
            ApiError::BadRequest(format!("{} is not valid UTF-8 text", self.filename))
        })
    }

    /// Language implied by the file extension; empty asks for detection.
    pub fn language_hint(&self) -> String {
        detect::language_for_path(Path::new(&self.filename))
            .map(|profile| profile.id.to_string())
            .unwrap_or_default()
    }
}

/// Parse the boolean spellings HTML forms and scripts send.
pub fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "Invalid preserve_structure value: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flag_accepts_form_spellings() {
        assert!(parse_flag("on").unwrap());
        assert!(parse_flag(" TRUE ").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(!parse_flag("false").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn language_hint_follows_extension() {
        let file = UploadedFile {
            filename: "lib/app.kt".to_string(),
            bytes: Bytes::from_static(b"fun main() {}"),
        };
        assert_eq!(file.language_hint(), "kotlin");

        let file = UploadedFile {
            filename: "notes".to_string(),
            bytes: Bytes::new(),
        };
        assert_eq!(file.language_hint(), "");
    }

    #[test]
    fn invalid_utf8_is_a_bad_request() {
        let file = UploadedFile {
            filename: "bin.py".to_string(),
            bytes: Bytes::from_static(&[0xff, 0xfe, 0x00]),
        };
        let err = file.text().unwrap_err();
        assert_eq!(err.to_string(), "bin.py is not valid UTF-8 text");
    }
}
