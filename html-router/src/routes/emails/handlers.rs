use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Form,
};
use serde::{Deserialize, Serialize};

use common::storage::types::{
    email_address::EmailAddress, system_settings::SystemSettings, user::User,
};

use crate::{
    html_state::HtmlState,
    middlewares::{
        auth_middleware::RequireUser,
        response_middleware::{HtmlError, TemplateResponse},
    },
};

#[derive(Serialize)]
pub struct EmailSettingsData {
    user: User,
    emails: Vec<EmailAddress>,
}

async fn settings_data(state: &HtmlState, user: User) -> Result<EmailSettingsData, HtmlError> {
    let emails = EmailAddress::list_for_user(&user.id, &state.db).await?;
    Ok(EmailSettingsData { user, emails })
}

pub async fn show_email_settings(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, HtmlError> {
    let data = settings_data(&state, user).await?;

    Ok(TemplateResponse::new_template(
        "settings/emails.html",
        data,
    ))
}

#[derive(Deserialize)]
pub struct AddEmailParams {
    email: String,
}

pub async fn add_email(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Form(form): Form<AddEmailParams>,
) -> Result<impl IntoResponse, HtmlError> {
    let email = form.email.trim().to_lowercase();
    if !email.contains('@') {
        return Ok(
            TemplateResponse::bad_request("That doesn't look like an email address")
                .into_response(),
        );
    }

    let settings = SystemSettings::get_current(&state.db).await?;
    EmailAddress::add(
        email,
        user.id.clone(),
        settings.require_email_verification,
        &state.db,
    )
    .await?;

    state.invalidate_dashboard_stats(&user.id).await;

    let data = settings_data(&state, user).await?;
    Ok(TemplateResponse::new_partial("settings/emails.html", "email_list", data).into_response())
}

#[derive(Deserialize)]
pub struct EmailTargetParams {
    email: String,
}

pub async fn delete_email(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Query(params): Query<EmailTargetParams>,
) -> Result<impl IntoResponse, HtmlError> {
    // The primary address backs sign-in and cannot be removed
    if params.email.eq_ignore_ascii_case(&user.email) {
        return Ok(
            TemplateResponse::bad_request("The primary address cannot be removed")
                .into_response(),
        );
    }

    EmailAddress::remove(&user.id, &params.email, &state.db).await?;

    state.invalidate_dashboard_stats(&user.id).await;

    let data = settings_data(&state, user).await?;
    Ok(TemplateResponse::new_partial("settings/emails.html", "email_list", data).into_response())
}

pub async fn resend_verification(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    Form(form): Form<EmailTargetParams>,
) -> Result<impl IntoResponse, HtmlError> {
    EmailAddress::reissue_token(&user.id, &form.email, &state.db).await?;

    let data = settings_data(&state, user).await?;
    Ok(TemplateResponse::new_partial(
        "settings/emails.html",
        "email_list",
        data,
    ))
}

#[derive(Deserialize)]
pub struct ConfirmParams {
    token: String,
}

pub async fn confirm_email(
    State(state): State<HtmlState>,
    Query(params): Query<ConfirmParams>,
) -> Result<impl IntoResponse, HtmlError> {
    match EmailAddress::confirm_by_token(&params.token, &state.db).await {
        Ok(address) => {
            state.invalidate_dashboard_stats(&address.user_id).await;
            Ok(TemplateResponse::redirect("/settings/emails"))
        }
        Err(_) => Ok(TemplateResponse::bad_request(
            "That confirmation link is no longer valid",
        )),
    }
}
