use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{SessionKey, SessionStore, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// `SQLite`-backed session store. Every key is namespaced by `scope`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    repo: SqliteRepository,
    scope: String,
}

impl SqliteSessionStore {
    #[must_use]
    pub fn new(repo: SqliteRepository, scope: impl Into<String>) -> Self {
        Self {
            repo,
            scope: scope.into(),
        }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT value
                FROM session_entries
                WHERE scope = ?1 AND key = ?2
            ",
        )
        .bind(&self.scope)
        .bind(key.as_str())
        .fetch_optional(self.repo.pool())
        .await
        .map_err(conn)?;

        row.map(|row| {
            row.try_get::<String, _>("value")
                .map_err(|e| StorageError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, key: SessionKey, value: String) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO session_entries (scope, key, value, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(scope, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(&self.scope)
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now())
        .execute(self.repo.pool())
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_entries WHERE scope = ?1")
            .bind(&self.scope)
            .execute(self.repo.pool())
            .await
            .map_err(conn)?;

        Ok(())
    }
}
