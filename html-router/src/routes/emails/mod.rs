pub mod handlers;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use handlers::{
    add_email, confirm_email, delete_email, resend_verification, show_email_settings,
};

use crate::html_state::HtmlState;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route(
            "/settings/emails",
            get(show_email_settings).post(add_email).delete(delete_email),
        )
        .route("/settings/emails/resend", post(resend_verification))
}

/// The confirmation link lands here from the mail itself, so it cannot sit
/// behind the auth wall.
pub fn public_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new().route("/settings/emails/confirm", get(confirm_email))
}
