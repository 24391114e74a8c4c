use sqlx::{PgPool, Row};
use tracing::warn;

use shared::error::{Error, ErrorCode, Result};
use shared::models::{Role, UserRecord};
use shared::session::Identity;

fn storage_error(e: sqlx::Error) -> Error {
    Error::with_details(ErrorCode::Transient, "User store unavailable", e.to_string())
}

/// Creates the user document on first sight; later calls are no-ops.
pub async fn ensure_user_record(pool: &PgPool, identity: &Identity) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (id, email, display_name, role, created_at)
         VALUES ($1, $2, $3, 'user', NOW())
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(&identity.uid)
    .bind(&identity.email)
    .bind(identity.display_name.as_deref().unwrap_or("User"))
    .execute(pool)
    .await
    .map_err(storage_error)?;
    Ok(())
}

pub async fn fetch_user(pool: &PgPool, uid: &str) -> Result<Option<UserRecord>> {
    let row = sqlx::query(
        "SELECT email, display_name, role, created_at FROM users WHERE id = $1",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await
    .map_err(storage_error)?;

    let Some(row) = row else { return Ok(None) };
    Ok(Some(UserRecord {
        email: row.try_get("email").map_err(storage_error)?,
        display_name: row.try_get("display_name").map_err(storage_error)?,
        role: Role::from(row.try_get::<String, _>("role").map_err(storage_error)?.as_str()),
        created_at: row.try_get("created_at").map_err(storage_error)?,
    }))
}

/// Degrades to `User` when the record is absent or the lookup fails.
pub async fn fetch_role(pool: &PgPool, uid: &str) -> Role {
    match fetch_user(pool, uid).await {
        Ok(Some(record)) => record.role,
        Ok(None) => Role::User,
        Err(e) => {
            warn!("Failed to fetch role for {uid}: {e}");
            Role::User
        }
    }
}
