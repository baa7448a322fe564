use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};

use serde::Serialize;

use crate::{
    middlewares::response_middleware::{HtmlError, TemplateResponse},
    AuthSessionType,
};
use common::storage::types::analytics::Analytics;

use crate::html_state::HtmlState;

#[derive(Serialize)]
pub struct LandingData {
    writers: i64,
}

pub async fn index_handler(
    State(state): State<HtmlState>,
    auth: AuthSessionType,
) -> Result<impl IntoResponse, HtmlError> {
    if auth.is_authenticated() {
        return Ok(TemplateResponse::redirect("/dashboard"));
    }

    let writers = Analytics::get_users_amount(&state.db).await.unwrap_or(0);

    Ok(TemplateResponse::new_template(
        "index/landing.html",
        LandingData { writers },
    ))
}

/// Serve an object (avatars) straight from the storage backend.
///
/// Object paths are normalized by the store, so traversal segments never reach
/// the filesystem backend.
pub async fn serve_stored_file(
    State(state): State<HtmlState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, HtmlError> {
    let stream = match state.storage.get_stream(&path).await {
        Ok(s) => s,
        Err(_) => return Ok(TemplateResponse::not_found().into_response()),
    };
    let body = Body::from_stream(stream);

    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    Ok((StatusCode::OK, headers, body).into_response())
}
