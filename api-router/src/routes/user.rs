use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use common::error::AppError;
use common::storage::types::user::{ProfileChanges, PublicUser, User};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Deserialize)]
pub struct UserLookupParams {
    id: Option<String>,
    username: Option<String>,
}

/// Fetch a user by id or username. Only public profile fields leave the server.
pub async fn get_user(
    State(state): State<ApiState>,
    Query(params): Query<UserLookupParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user = match (params.id.as_deref(), params.username.as_deref()) {
        (Some(id), _) => state
            .db
            .get_item::<User>(id)
            .await
            .map_err(AppError::from)?,
        (None, Some(username)) => User::find_by_username(username, &state.db).await?,
        (None, None) => {
            return Err(ApiError::ValidationError(
                "Provide an id or a username".to_string(),
            ))
        }
    };

    let user = user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "data": PublicUser::from(&user) })))
}

#[derive(Deserialize)]
pub struct UserTargetParams {
    id: String,
}

/// Update a profile. Callers can only touch their own account; the username
/// change throttle surfaces as a 403 with the remaining wait.
pub async fn update_user(
    State(state): State<ApiState>,
    Extension(caller): Extension<User>,
    Query(params): Query<UserTargetParams>,
    Json(changes): Json<ProfileChanges>,
) -> Result<impl IntoResponse, ApiError> {
    if caller.id != params.id {
        return Err(ApiError::Forbidden(
            "You cannot edit another user's profile".to_string(),
        ));
    }

    let updated = User::update_profile(&params.id, changes, &state.db).await?;

    Ok(Json(json!({ "data": PublicUser::from(&updated) })))
}

/// Delete an account together with its posts, email addresses and uploads.
pub async fn delete_user(
    State(state): State<ApiState>,
    Extension(caller): Extension<User>,
    Query(params): Query<UserTargetParams>,
) -> Result<impl IntoResponse, ApiError> {
    if caller.id != params.id {
        return Err(ApiError::Forbidden(
            "You cannot delete another user's account".to_string(),
        ));
    }

    User::delete_account(&params.id, &state.db, &state.storage).await?;

    Ok(Json(json!({ "data": null, "status": "ok" })))
}
