pub mod seed;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use thiserror::Error;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the daemon indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Display format for creation timestamps on the REST wire.
/// Stored timestamps keep full RFC 3339 precision; only display is truncated.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(QUERY_TIMEOUT.as_secs())),
    }
}

/// Errors surfaced by the version store.
///
/// Not-found variants are the only store errors a client ever sees (mapped to
/// HTTP 404 by the REST layer); everything else is a 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0} not found")]
    DocumentNotFound(i64),
    #[error("version {0} not found")]
    VersionNotFound(i64),
    #[error("database query timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// The live, mutable editable text unit.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub content: String,
    pub created_at: String,
}

/// An immutable-in-intent snapshot of a document's content.
///
/// `parent_document_id` is not a foreign key — a version may outlive its
/// document and dangling references are tolerated everywhere.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VersionRow {
    pub id: i64,
    pub parent_document_id: i64,
    pub content: String,
    pub created_at: String,
}

/// Summary projection used by listings — no content column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VersionSummary {
    pub id: i64,
    pub parent_document_id: i64,
    pub created_at: String,
}

impl VersionRow {
    /// Minute-precision creation timestamp for display, e.g. `"2024-03-01 14:05"`.
    pub fn created_at_display(&self) -> String {
        format_display(&self.created_at)
    }
}

impl VersionSummary {
    pub fn created_at_display(&self) -> String {
        format_display(&self.created_at)
    }
}

fn format_display(rfc3339: &str) -> String {
    match DateTime::parse_from_rfc3339(rfc3339) {
        Ok(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        // Stored by us, so this only triggers on a hand-edited database.
        Err(_) => rfc3339.to_string(),
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("draftd.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            use sqlx::ConnectOptions;
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        // AUTOINCREMENT keeps version ids globally unique and never reused,
        // even after deletes.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 content TEXT NOT NULL,
                 created_at TEXT NOT NULL
             )",
        )
        .execute(pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS versions (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 parent_document_id INTEGER NOT NULL,
                 content TEXT NOT NULL,
                 created_at TEXT NOT NULL
             )",
        )
        .execute(pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_versions_parent ON versions(parent_document_id)",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    // ─── Documents ──────────────────────────────────────────────────────────

    pub async fn get_document(&self, id: i64) -> Result<DocumentRow, StoreError> {
        sqlx::query_as("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::DocumentNotFound(id))
    }

    /// Overwrite a document's content in place. Idempotent.
    pub async fn save_document_content(
        &self,
        id: i64,
        content: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE documents SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::DocumentNotFound(id));
        }
        Ok(())
    }

    pub async fn count_documents(&self) -> Result<u64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }

    /// Insert a document with an explicit id. Used only by bootstrap seeding.
    pub async fn insert_document_with_id(
        &self,
        id: i64,
        content: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO documents (id, content, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(content)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ─── Versions ───────────────────────────────────────────────────────────

    /// Snapshot `content` as a new version of `document_id`.
    ///
    /// No validation beyond non-null — empty content is accepted, and the
    /// parent document is not required to exist.
    pub async fn create_version(
        &self,
        document_id: i64,
        content: &str,
    ) -> Result<VersionRow, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO versions (parent_document_id, content, created_at) VALUES (?, ?, ?)",
        )
        .bind(document_id)
        .bind(content)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        self.get_version(id).await
    }

    pub async fn get_version(&self, id: i64) -> Result<VersionRow, StoreError> {
        sqlx::query_as("SELECT * FROM versions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::VersionNotFound(id))
    }

    /// Overwrite an existing version's content in place.
    ///
    /// Versions are snapshots in intent, but in-place amendment is a
    /// first-class operation here, not an accident.
    pub async fn update_version_content(
        &self,
        id: i64,
        content: &str,
    ) -> Result<VersionRow, StoreError> {
        let result = sqlx::query("UPDATE versions SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::VersionNotFound(id));
        }
        self.get_version(id).await
    }

    /// Delete a version permanently. A second delete of the same id reports
    /// `VersionNotFound` rather than succeeding silently.
    pub async fn delete_version(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM versions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::VersionNotFound(id));
        }
        Ok(())
    }

    /// Summaries of one document's versions, oldest first.
    ///
    /// Ties on `created_at` break by insertion order (id ascending) since
    /// timestamps can collide at display granularity. Unknown documents yield
    /// an empty list, not an error.
    pub async fn list_versions_for_document(
        &self,
        document_id: i64,
    ) -> Result<Vec<VersionSummary>, StoreError> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT id, parent_document_id, created_at FROM versions
                 WHERE parent_document_id = ?
                 ORDER BY created_at, id",
            )
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    /// All version summaries grouped by raw parent id, including parents that
    /// no longer (or never did) exist as documents.
    pub async fn list_all_versions_grouped(
        &self,
    ) -> Result<std::collections::BTreeMap<i64, Vec<VersionSummary>>, StoreError> {
        let rows: Vec<VersionSummary> = with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT id, parent_document_id, created_at FROM versions
                 ORDER BY created_at, id",
            )
            .fetch_all(&self.pool)
            .await?)
        })
        .await?;

        let mut grouped: std::collections::BTreeMap<i64, Vec<VersionSummary>> =
            std::collections::BTreeMap::new();
        for row in rows {
            grouped.entry(row.parent_document_id).or_default().push(row);
        }
        Ok(grouped)
    }
}
