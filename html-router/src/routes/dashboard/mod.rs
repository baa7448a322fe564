pub mod handlers;

use axum::{extract::FromRef, routing::get, Router};
use handlers::{show_dashboard, show_stats};

use crate::html_state::HtmlState;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route("/dashboard", get(show_dashboard))
        .route("/dashboard/stats", get(show_stats))
}
