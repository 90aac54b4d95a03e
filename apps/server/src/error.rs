//! # API Error Handling
//!
//! Converts domain errors into HTTP responses.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Propagation                               │
//! │                                                                         │
//! │  ValidationError ─► CoreError ─► DbError ─► ApiError ─► HTTP response  │
//! │                                                                         │
//! │  Business rule / validation ...... 400  {"success":false,"error":"…"}  │
//! │  No or expired session ........... 401                                  │
//! │  Role not allowed ................ 403                                  │
//! │  Unknown id ...................... 404                                  │
//! │  Duplicate kode / username ....... 409                                  │
//! │  Anything else ................... 500  (generic message, logged)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use niaga_core::{CoreError, ValidationError};
use niaga_db::DbError;
use serde_json::json;
use tracing::{debug, error};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Logged in full, returned as a generic message.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Silakan login terlebih dahulu".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("Akses hanya untuk admin".to_string())
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{} tidak ditemukan: {}", entity, id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Terjadi kesalahan pada server".to_string()
            }
            other => {
                debug!(status = status.as_u16(), error = %other, "Request rejected");
                other.to_string()
            }
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::Conflict(format!("{} '{}' sudah dipakai", field, value))
            }
            DbError::ForeignKeyViolation { message } => ApiError::BadRequest(format!(
                "Referensi tidak valid: {}",
                message
            )),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ApiError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ApiError::Internal(format!("xlsx export failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use niaga_core::Money;

    #[test]
    fn test_business_errors_are_bad_request() {
        let err: ApiError = DbError::Core(CoreError::InsufficientStock {
            kode: "SRJ-01".to_string(),
            tersedia: 10,
            diminta: 48,
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("SRJ-01"));

        let err: ApiError = CoreError::CreditNotAllowed {
            sisa: Money::from_rupiah(5_000),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::duplicate("kode", "SRJ-01").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::not_found("Barang", "abc").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
