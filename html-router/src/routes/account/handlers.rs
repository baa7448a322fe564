use axum::{extract::State, response::IntoResponse, Form};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    html_state::HtmlState,
    middlewares::{
        auth_middleware::RequireUser,
        response_middleware::{HtmlError, TemplateResponse},
    },
    AuthSessionType,
};
use common::error::AppError;
use common::storage::types::user::{ProfileChanges, User};

#[derive(Serialize)]
pub struct AccountPageData {
    user: User,
}

pub async fn show_account_page(
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, HtmlError> {
    Ok(TemplateResponse::new_template(
        "account/settings.html",
        AccountPageData { user },
    ))
}

#[derive(Deserialize)]
pub struct ProfileForm {
    username: String,
    full_name: String,
    bio: String,
}

pub async fn update_profile(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    auth: AuthSessionType,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse, HtmlError> {
    let updated_user = User::update_profile(
        &user.id,
        ProfileChanges {
            username: Some(form.username.trim().to_string()),
            full_name: Some(form.full_name.trim().to_string()),
            bio: Some(form.bio.trim().to_string()),
        },
        &state.db,
    )
    .await?;

    // Clear the cache so the session picks up the new profile
    auth.cache_clear_user(user.id);

    Ok(TemplateResponse::new_partial(
        "account/settings.html",
        "profile_section",
        AccountPageData { user: updated_user },
    ))
}

#[derive(Deserialize)]
pub struct NewPasswordForm {
    old_password: String,
    new_password: String,
}

pub async fn change_password(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    auth: AuthSessionType,
    Form(form): Form<NewPasswordForm>,
) -> Result<impl IntoResponse, HtmlError> {
    // Authenticate to make sure the password matches
    let authenticated_user = User::authenticate(&user.email, &form.old_password, &state.db).await?;

    User::patch_password(&authenticated_user.email, &form.new_password, &state.db).await?;

    auth.cache_clear_user(user.id);

    Ok(TemplateResponse::new_partial(
        "account/settings.html",
        "change_password_section",
        (),
    ))
}

const ALLOWED_AVATAR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(TryFromMultipart)]
pub struct AvatarUpload {
    pub avatar: FieldData<Bytes>,
}

pub async fn upload_avatar(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    auth: AuthSessionType,
    TypedMultipart(upload): TypedMultipart<AvatarUpload>,
) -> Result<impl IntoResponse, HtmlError> {
    let file_name = upload.avatar.metadata.file_name.clone().unwrap_or_default();
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_AVATAR_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(
            TemplateResponse::bad_request("Avatars must be png, jpg, webp or gif")
                .into_response(),
        );
    }

    let contents = upload.avatar.contents;
    if contents.is_empty() {
        return Ok(TemplateResponse::bad_request("The uploaded file is empty").into_response());
    }

    // Content-addressed location, so re-uploads of the same image are no-ops
    let digest = Sha256::digest(&contents);
    let digest = format!("{digest:x}");
    let short_hash = digest.get(..16).unwrap_or(&digest);
    let location = format!("{}/avatar/{short_hash}.{extension}", user.id);

    state
        .storage
        .put(&location, contents)
        .await
        .map_err(AppError::from)?;

    let avatar_url = format!("/files/{location}");
    User::update_avatar_url(&user.id, &avatar_url, &state.db).await?;

    auth.cache_clear_user(user.id.clone());

    let updated_user = User {
        avatar_url: Some(avatar_url),
        ..user
    };

    Ok(TemplateResponse::new_partial(
        "account/settings.html",
        "avatar_section",
        AccountPageData { user: updated_user },
    )
    .into_response())
}

pub async fn set_api_key(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    auth: AuthSessionType,
) -> Result<impl IntoResponse, HtmlError> {
    // Generate and set the API key
    let api_key = User::set_api_key(&user.id, &state.db).await?;

    // Clear the cache so new requests have access to the user with api key
    auth.cache_clear_user(user.id.to_string());

    let updated_user = User {
        api_key: Some(api_key),
        ..user.clone()
    };

    Ok(TemplateResponse::new_partial(
        "account/settings.html",
        "api_key_section",
        AccountPageData { user: updated_user },
    ))
}

pub async fn revoke_api_key(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    auth: AuthSessionType,
) -> Result<impl IntoResponse, HtmlError> {
    User::revoke_api_key(&user.id, &state.db).await?;

    auth.cache_clear_user(user.id.to_string());

    let updated_user = User {
        api_key: None,
        ..user.clone()
    };

    Ok(TemplateResponse::new_partial(
        "account/settings.html",
        "api_key_section",
        AccountPageData { user: updated_user },
    ))
}

pub async fn delete_account(
    State(state): State<HtmlState>,
    RequireUser(user): RequireUser,
    auth: AuthSessionType,
) -> Result<impl IntoResponse, HtmlError> {
    User::delete_account(&user.id, &state.db, &state.storage).await?;
    state.invalidate_dashboard_stats(&user.id).await;

    auth.logout_user();

    auth.session.destroy();

    Ok(TemplateResponse::redirect("/"))
}
