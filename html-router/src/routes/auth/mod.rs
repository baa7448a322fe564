pub mod signin;
pub mod signout;
pub mod signup;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};

use crate::html_state::HtmlState;

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route("/signin", get(signin::show_signin_form))
        .route("/signin", post(signin::authenticate_user))
        .route("/signup", get(signup::show_signup_form))
        .route("/signup", post(signup::process_signup))
        .route("/signout", get(signout::sign_out_user))
}
