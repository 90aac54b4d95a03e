//! JWT session module.
//!
//! Handles session token generation and validation, and the extractors that
//! guard protected routes.
//!
//! ## Session Flow
//! ```text
//! POST /api/auth/login ──► argon2 verify ──► JWT (HS256) ──► Set-Cookie: token=…; HttpOnly
//!
//! protected request ──► cookie `token` (or `Authorization: Bearer …`)
//!                       ──► decode + expiry check ──► user still active? ──► AuthUser
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use niaga_core::{Role, User};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::SharedState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    pub role: Role,

    /// Employee linked to the account, if any
    pub karyawan_id: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate a session token for a user.
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            karyawan_id: user.karyawan_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                ApiError::unauthorized()
            })?;

        Ok(token_data.claims)
    }

    /// `Set-Cookie` value carrying a fresh session.
    pub fn session_cookie(&self, token: String, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .build()
    }
}

/// Cookie that clears the session on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string)
}

// =============================================================================
// Extractors
// =============================================================================

/// The logged-in user of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.claims.sub
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role == Role::Admin
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or_else(ApiError::unauthorized)?;
        let claims = state.jwt.validate(&token)?;

        // A deactivated account loses access before its token expires.
        match state.db.users().get_by_id(&claims.sub).await? {
            Some(user) if user.is_active => Ok(AuthUser { claims }),
            _ => {
                debug!(user_id = %claims.sub, "Session for inactive or deleted user");
                Err(ApiError::unauthorized())
            }
        }
    }
}

/// A logged-in user with the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden());
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "user-001".to_string(),
            username: "kasir1".to_string(),
            password_hash: String::new(),
            role,
            karyawan_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret-0123456789", 3600);

        let token = manager.issue(&user(Role::Kasir)).unwrap();
        let claims = manager.validate(&token).unwrap();

        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.username, "kasir1");
        assert_eq!(claims.role, Role::Kasir);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("test-secret-0123456789", 3600);
        let other = JwtManager::new("another-secret-9876543210", 3600);

        let token = issuer.issue(&user(Role::Admin)).unwrap();
        assert!(matches!(other.validate(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Default validation allows 60s leeway.
        let manager = JwtManager::new("test-secret-0123456789", -120);
        let token = manager.issue(&user(Role::Admin)).unwrap();
        assert!(manager.validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_session_cookie_flags() {
        let manager = JwtManager::new("test-secret-0123456789", 3600);
        let cookie = manager.session_cookie("abc".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
