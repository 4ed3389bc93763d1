//! SQLite database operations
//!
//! All database access goes through this module.

use std::path::Path;

use async_trait::async_trait;
use sqlx::{Pool, Sqlite, SqlitePool};

use super::models::User;
use crate::error::AppError;

/// The Users collaborator behind the authenticator.
///
/// [`Database`] is the production implementation; authenticator tests
/// substitute a mock to pin lookup-or-create behavior without a pool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by email address (at most one row).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Insert a new user row, returning the row the database reports back.
    ///
    /// `None` means the insert ran but produced no row; callers decide how
    /// fatal that is.
    async fn insert_user(&self, user: &User) -> Result<Option<User>, AppError>;
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the SQLite file database and run migrations.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> Result<Option<User>, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, user_id, email, password, name, image, provider,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, email, password, name, image, provider,
                      created_at, updated_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(&user.image)
        .bind(&user.provider)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(created)
    }
}
