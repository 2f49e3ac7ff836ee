//! Postgres-backed user directory.
//!
//! One `users` table keyed by id, with a unique index on the normalised
//! e-mail. Uniqueness is enforced by the database; a unique violation on
//! insert or update surfaces as [`DirectoryError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use warden_auth::{DirectoryError, Role, UserDirectory, UserRecord};
use warden_core::{Email, UserId};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            UUID PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL
)
"#;

const COLUMNS: &str = "id, email, name, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, DirectoryError> {
        let pool = PgPool::connect(database_url).await.map_err(unavailable)?;
        Ok(Self::new(pool))
    }

    /// Create the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), DirectoryError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Unavailable(err.to_string())
}

fn write_error(err: sqlx::Error) -> DirectoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DirectoryError::Conflict;
        }
    }
    unavailable(err)
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, DirectoryError> {
    let corrupt = |what: &str, detail: String| {
        DirectoryError::Unavailable(format!("corrupt users row ({what}): {detail}"))
    };

    let id: Uuid = row.try_get("id").map_err(unavailable)?;
    let email: String = row.try_get("email").map_err(unavailable)?;
    let role: String = row.try_get("role").map_err(unavailable)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(unavailable)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(unavailable)?;

    Ok(UserRecord {
        id: UserId::from_uuid(id),
        email: Email::parse(&email).map_err(|e| corrupt("email", e.to_string()))?,
        name: row.try_get("name").map_err(unavailable)?,
        password_hash: row.try_get("password_hash").map_err(unavailable)?,
        role: role
            .parse::<Role>()
            .map_err(|e| corrupt("role", e.to_string()))?,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, DirectoryError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        row.try_get::<bool, _>(0).map_err(unavailable)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn create(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update(&self, user: &UserRecord) -> Result<bool, DirectoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, name = $3, password_hash = $4, role = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: UserId) -> Result<bool, DirectoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(result.rows_affected() > 0)
    }
}
