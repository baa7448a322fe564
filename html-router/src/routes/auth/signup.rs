use axum::{extract::State, response::IntoResponse, Form};
use axum_htmx::HxBoosted;
use serde::{Deserialize, Serialize};

use common::storage::types::{email_address::EmailAddress, system_settings::SystemSettings, user::User};

use crate::{
    html_state::HtmlState,
    middlewares::response_middleware::{HtmlError, TemplateResponse},
    AuthSessionType,
};

#[derive(Deserialize, Serialize)]
pub struct SignupParams {
    pub email: String,
    pub password: String,
    pub username: String,
}

pub async fn show_signup_form(
    auth: AuthSessionType,
    HxBoosted(boosted): HxBoosted,
) -> Result<impl IntoResponse, HtmlError> {
    if auth.is_authenticated() {
        return Ok(TemplateResponse::redirect("/dashboard"));
    }

    if boosted {
        Ok(TemplateResponse::new_partial(
            "auth/signup_base.html",
            "body",
            (),
        ))
    } else {
        Ok(TemplateResponse::new_template("auth/signup_base.html", ()))
    }
}

pub async fn process_signup(
    State(state): State<HtmlState>,
    auth: AuthSessionType,
    Form(form): Form<SignupParams>,
) -> Result<impl IntoResponse, HtmlError> {
    let user =
        match User::create_new(form.email, form.password, form.username, &state.db).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("{:?}", e);
                return Ok(TemplateResponse::bad_request(&e.to_string()).into_response());
            }
        };

    // The primary address is tracked alongside any extra ones
    let settings = SystemSettings::get_current(&state.db).await?;
    EmailAddress::add(
        user.email.clone(),
        user.id.clone(),
        settings.require_email_verification,
        &state.db,
    )
    .await?;

    auth.login_user(user.id);

    Ok(TemplateResponse::redirect("/dashboard").into_response())
}
