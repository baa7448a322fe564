pub mod handlers;

use axum::{extract::FromRef, routing::get, Router};
use handlers::{index_handler, serve_stored_file};

use crate::html_state::HtmlState;

pub fn public_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route("/", get(index_handler))
        .route("/files/{*path}", get(serve_stored_file))
}
