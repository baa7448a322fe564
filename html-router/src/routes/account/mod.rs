pub mod handlers;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use handlers::{
    change_password, delete_account, revoke_api_key, set_api_key, show_account_page,
    update_profile, upload_avatar,
};

use crate::html_state::HtmlState;

pub fn router<S>(max_avatar_bytes: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route("/account", get(show_account_page).delete(delete_account))
        .route("/account/profile", post(update_profile))
        .route("/account/password", post(change_password))
        .route(
            "/account/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(max_avatar_bytes)),
        )
        .route("/account/api-key", post(set_api_key).delete(revoke_api_key))
}
