//! User management. Admin only.

use axum::extract::{Path, State};
use niaga_core::User;
use niaga_db::repository::user::NewUser;
use serde::Deserialize;
use tracing::info;

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::found;
use crate::response::{ApiJson, ApiResponse};
use crate::SharedState;

/// Partial update: reset a password and/or enable or disable the account.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub async fn list(
    State(state): State<SharedState>,
    _admin: AdminUser,
) -> ApiResult<ApiResponse<Vec<User>>> {
    Ok(ApiResponse::ok(state.db.users().list().await?))
}

pub async fn create(
    State(state): State<SharedState>,
    _admin: AdminUser,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<ApiResponse<User>> {
    Ok(ApiResponse::created(state.db.users().create(&input).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UserUpdate>,
) -> ApiResult<ApiResponse<User>> {
    if input.is_active == Some(false) && id == admin.id() {
        return Err(ApiError::BadRequest(
            "Tidak dapat menonaktifkan akun sendiri".to_string(),
        ));
    }

    let users = state.db.users();
    if let Some(password) = &input.password {
        users.change_password(&id, password).await?;
        info!(user_id = %id, by = %admin.id(), "Password reset by admin");
    }
    if let Some(active) = input.is_active {
        users.set_active(&id, active).await?;
        info!(user_id = %id, active, by = %admin.id(), "User activation changed");
    }

    let user = found(users.get_by_id(&id).await?, "User", &id)?;
    Ok(ApiResponse::ok(user))
}
