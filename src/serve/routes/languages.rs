use axum::Json;
use serde::Serialize;

use crate::profile;

#[derive(Debug, Serialize)]
pub struct SupportedLanguages {
    pub languages: Vec<&'static str>,
    pub count: usize,
}

/// GET /api/languages: sorted language ids
pub async fn list() -> Json<Vec<&'static str>> {
    Json(profile::languages())
}

/// GET /api/supported-languages
pub async fn supported() -> Json<SupportedLanguages> {
    let languages = profile::languages();
    Json(SupportedLanguages {
        count: languages.len(),
        languages,
    })
}
