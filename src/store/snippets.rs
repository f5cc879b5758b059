//! PostgreSQL-backed snippet storage.
//!
//! All expiry arithmetic happens inside the database engine (`NOW()` in
//! UTC), so clock skew between application hosts never affects which
//! snippets count as live.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

/// How many snippets [`SnippetStore::latest`] returns at most.
const LATEST_LIMIT: i64 = 10;

/// Errors produced by the snippet store.
///
/// The `NotFound`/`Storage` split is the store's one essential contract:
/// callers map `NotFound` to a missing-resource response and everything
/// else to an internal error. No kind is ever downgraded.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Exactly one row was expected and zero matched. The only kind
    /// expected to occur in normal operation.
    #[error("no matching record found")]
    NotFound,

    /// Any other persistence failure: connection, SQL, row decoding.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// One stored note. Rows are never updated in place; a snippet effectively
/// disappears once `expires` passes, as queries stop returning it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// Snippet storage over a shared connection pool.
///
/// Cheap to clone (the pool is reference-counted). The store never holds a
/// transaction across calls and never retries; failures propagate to the
/// caller with their kind preserved.
#[derive(Clone)]
pub struct SnippetStore {
    pool: PgPool,
}

impl SnippetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one snippet that stays live for `lifetime_days` days and
    /// return its store-assigned id.
    ///
    /// Inputs are stored as given; validation of empty text or
    /// non-positive lifetimes belongs to the caller.
    pub async fn insert(
        &self,
        title: &str,
        content: &str,
        lifetime_days: i32,
    ) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO snippets (title, content, created, expires)
            VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(lifetime_days)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, "Snippet inserted");
        Ok(id)
    }

    /// Fetch the live snippet with the given id.
    ///
    /// Returns [`StoreError::NotFound`] when no live row matches, which
    /// covers ids that were never assigned as well as expired snippets.
    pub async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        let snippet = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW() AND id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        snippet.ok_or(StoreError::NotFound)
    }

    /// The ten most recently created live snippets, newest first.
    ///
    /// An empty result is an empty vec, never `NotFound`. `fetch_all`
    /// drains and releases the server-side cursor even when a mid-scan
    /// row fails to decode, so the shared pool cannot leak a connection
    /// here.
    pub async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let snippets = sqlx::query_as::<_, Snippet>(
            r#"
            SELECT id, title, content, created, expires
            FROM snippets
            WHERE expires > NOW()
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(LATEST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(snippets)
    }

    /// Round-trip check against the database, for health reporting.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Current pool size and idle connection count.
    pub fn pool_status(&self) -> (u32, usize) {
        (self.pool.size(), self.pool.num_idle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_not_found_is_distinct_from_storage() {
        let not_found = StoreError::NotFound;
        let storage = StoreError::Storage(sqlx::Error::PoolClosed);

        assert!(matches!(not_found, StoreError::NotFound));
        assert!(matches!(storage, StoreError::Storage(_)));
        assert_eq!(not_found.to_string(), "no matching record found");
    }

    #[test]
    fn test_snippet_serializes_for_templates() {
        let created = Utc::now();
        let snippet = Snippet {
            id: 34,
            title: "O snail".to_string(),
            content: "O snail\nClimb Mount Fuji,\nBut slowly, slowly!".to_string(),
            created,
            expires: created + Duration::days(7),
        };

        let value = serde_json::to_value(&snippet).unwrap();
        assert_eq!(value["id"], 34);
        assert_eq!(value["title"], "O snail");
        assert!(value["created"].is_string());
        assert!(value["expires"].is_string());
    }
}
