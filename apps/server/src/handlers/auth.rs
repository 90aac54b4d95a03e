//! Login, logout and the current session.

use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use niaga_core::validation::validate_password;
use niaga_core::{Role, User};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{removal_cookie, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::handlers::found;
use crate::response::{ApiJson, ApiResponse};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub karyawan_id: Option<String>,
    /// Unix timestamp at which the session ends.
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password_lama: String,
    pub password_baru: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<(CookieJar, ApiResponse<SessionInfo>)> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username dan password wajib diisi".to_string(),
        ));
    }

    let user: User = match state
        .db
        .users()
        .verify_credentials(username, &req.password)
        .await?
    {
        Some(user) => user,
        None => {
            warn!(username = %username, "Login rejected");
            return Err(ApiError::Unauthorized(
                "Username atau password salah".to_string(),
            ));
        }
    };

    let token = state.jwt.issue(&user)?;
    let claims = state.jwt.validate(&token)?;
    let cookie = state.jwt.session_cookie(token, state.config.cookie_secure);

    info!(user_id = %user.id, username = %user.username, role = ?user.role, "Login");

    Ok((
        jar.add(cookie),
        ApiResponse::ok(SessionInfo {
            id: user.id,
            username: user.username,
            role: user.role,
            karyawan_id: user.karyawan_id,
            expires_at: claims.exp,
        }),
    ))
}

/// `POST /api/auth/logout`
///
/// Always succeeds; a missing or stale cookie is simply cleared.
pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<bool>) {
    (jar.remove(removal_cookie()), ApiResponse::ok(true))
}

/// `GET /api/auth/me`
pub async fn me(user: AuthUser) -> ApiResponse<SessionInfo> {
    let claims = user.claims;
    ApiResponse::ok(SessionInfo {
        id: claims.sub,
        username: claims.username,
        role: claims.role,
        karyawan_id: claims.karyawan_id,
        expires_at: claims.exp,
    })
}

/// `PUT /api/auth/password`
pub async fn change_password(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<bool>> {
    validate_password(&req.password_baru)?;

    let account = found(
        state.db.users().get_by_id(user.id()).await?,
        "User",
        user.id(),
    )?;
    let verified = state
        .db
        .users()
        .verify_credentials(&account.username, &req.password_lama)
        .await?;
    if verified.is_none() {
        return Err(ApiError::BadRequest("Password lama salah".to_string()));
    }

    state
        .db
        .users()
        .change_password(user.id(), &req.password_baru)
        .await?;
    Ok(ApiResponse::ok(true))
}
