pub mod handlers;

use axum::{extract::FromRef, routing::get, Router};
use handlers::{show_profile, show_published_post};

use crate::html_state::HtmlState;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route("/{username}", get(show_profile))
        .route("/{username}/{slug}", get(show_published_post))
}
