//! # User Repository
//!
//! Login accounts. Passwords are stored as argon2 PHC strings and verified
//! here so that the HTTP layer never handles a hash.
//!
//! ```text
//! POST /api/auth/login { username, password }
//!      │
//!      ▼
//! verify_credentials() ── argon2 verify ──► Some(User) → JWT cookie
//!                                      └──► None       → 401
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use niaga_core::validation::{validate_password, validate_username};
use niaga_core::{Role, User};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::generate_id;
use crate::error::{DbError, DbResult};

const COLUMNS: &str =
    "id, username, password_hash, role, karyawan_id, is_active, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub karyawan_id: Option<String>,
}

/// Hashes a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users ORDER BY username");
        let rows = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE username = ?1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, input: &NewUser) -> DbResult<User> {
        validate_username(&input.username)?;
        validate_password(&input.password)?;

        let id = generate_id();
        let hash = hash_password(&input.password)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, karyawan_id, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
        )
        .bind(&id)
        .bind(input.username.trim())
        .bind(&hash)
        .bind(input.role)
        .bind(&input.karyawan_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, input.username.trim())
            }
            other => other,
        })?;

        info!(id = %id, username = %input.username, role = ?input.role, "User created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &id))
    }

    /// Returns the active user when the password matches.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            debug!(username = %username, "Login for unknown user");
            return Ok(None);
        };

        if !user.is_active {
            warn!(username = %username, "Login for inactive user");
            return Ok(None);
        }

        if !verify_password(password, &user.password_hash) {
            warn!(username = %username, "Wrong password");
            return Ok(None);
        }

        Ok(Some(user))
    }

    pub async fn change_password(&self, id: &str, password: &str) -> DbResult<()> {
        validate_password(password)?;
        let hash = hash_password(password)?;

        let result = sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(&hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        info!(id = %id, "Password changed");
        Ok(())
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("salah", &hash));
        assert!(!verify_password("rahasia123", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let (db, admin) = setup().await;
        assert_eq!(admin.role, Role::Admin);

        let ok = db.users().verify_credentials("admin", "rahasia123").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(admin.id.clone()));
        assert!(db.users().verify_credentials("admin", "salah").await.unwrap().is_none());
        assert!(db.users().verify_credentials("nobody", "rahasia123").await.unwrap().is_none());

        db.users().set_active(&admin.id, false).await.unwrap();
        assert!(db.users().verify_credentials("admin", "rahasia123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_password_change() {
        let (db, admin) = setup().await;
        let err = db
            .users()
            .create(&NewUser {
                username: "admin".to_string(),
                password: "rahasia456".to_string(),
                role: Role::Kasir,
                karyawan_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        db.users().change_password(&admin.id, "baru-12345").await.unwrap();
        assert!(db.users().verify_credentials("admin", "baru-12345").await.unwrap().is_some());
    }
}
