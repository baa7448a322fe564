use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use common::storage::types::{
    email_address::EmailAddress, system_settings::SystemSettings, user::User,
};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Serialize)]
pub struct EmailRecord {
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub primary: bool,
}

fn to_record(address: EmailAddress, primary_email: &str) -> EmailRecord {
    EmailRecord {
        primary: address.email == primary_email,
        email: address.email,
        email_confirmed_at: address.email_confirmed_at,
        created_at: address.created_at,
    }
}

/// The path id names the account the addresses belong to; only that account's
/// API key may touch them.
fn authorize(caller: &User, id: &str) -> Result<(), ApiError> {
    if caller.id != id {
        return Err(ApiError::Forbidden(
            "You cannot manage another user's addresses".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_emails(
    State(state): State<ApiState>,
    Extension(caller): Extension<User>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, &id)?;

    let addresses = EmailAddress::list_for_user(&id, &state.db).await?;
    let records: Vec<EmailRecord> = addresses
        .into_iter()
        .map(|address| to_record(address, &caller.email))
        .collect();

    Ok(Json(json!({ "data": records })))
}

#[derive(Deserialize)]
pub struct EmailPayload {
    email: String,
}

pub async fn insert_email(
    State(state): State<ApiState>,
    Extension(caller): Extension<User>,
    Path(id): Path<String>,
    Json(payload): Json<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, &id)?;

    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::ValidationError(
            "That doesn't look like an email address".to_string(),
        ));
    }

    let settings = SystemSettings::get_current(&state.db).await?;
    let added =
        EmailAddress::add(email, id, settings.require_email_verification, &state.db).await?;

    Ok(Json(json!({ "data": to_record(added, &caller.email) })))
}

/// The only mutable aspect of an address is its verification state, so an
/// update re-issues the confirmation token.
pub async fn update_email(
    State(state): State<ApiState>,
    Extension(caller): Extension<User>,
    Path(id): Path<String>,
    Json(payload): Json<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, &id)?;

    let updated = EmailAddress::reissue_token(&id, payload.email.trim(), &state.db).await?;

    Ok(Json(json!({ "data": to_record(updated, &caller.email) })))
}

pub async fn delete_email(
    State(state): State<ApiState>,
    Extension(caller): Extension<User>,
    Path(id): Path<String>,
    Json(payload): Json<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, &id)?;

    if payload.email.eq_ignore_ascii_case(&caller.email) {
        return Err(ApiError::ValidationError(
            "The primary address cannot be removed".to_string(),
        ));
    }

    EmailAddress::remove(&id, payload.email.trim(), &state.db).await?;

    Ok(Json(json!({ "data": null, "status": "ok" })))
}
