//! Database Connection Management
//!
//! This module provides the core database connection and initialization
//! functionality using libsql (embedded SQLite).
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf, creating parent directories
//! - **Idempotent schema**: `CREATE ... IF NOT EXISTS` on every start
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Foreign keys**: Enabled on every connection for referential integrity
//!
//! # Database Connection Patterns
//!
//! **Always use `connect_with_timeout()` in async functions.** It applies the
//! per-connection pragmas (5 second busy timeout, foreign keys) so concurrent
//! writers wait instead of failing immediately with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use spectree_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/spectree.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! - `project_dev_specs`: dev-spec tree (projects and pages)
//! - `dev_spec_contents`: typed documents and note sections per dev spec
//! - `organizations`: organization tree
//! - `users`: member accounts, optionally assigned to one organization
//!
//! Sibling names are unique through an expression index on
//! `(COALESCE(parent_id, 0), name)`, which puts all roots in one group.

use crate::db::error::DatabaseError;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

const SCHEMA: &[(&str, &str)] = &[
    (
        "project_dev_specs table",
        "CREATE TABLE IF NOT EXISTS project_dev_specs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES project_dev_specs(id) ON DELETE CASCADE,
            sort_order INTEGER NOT NULL DEFAULT 0,
            depth INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            type TEXT NOT NULL CHECK (type IN ('PROJECT', 'PAGE')),
            status TEXT NOT NULL DEFAULT 'TODO' CHECK (status IN ('TODO', 'IN_PROGRESS', 'DONE'))
        )",
    ),
    (
        "dev_spec_contents table",
        "CREATE TABLE IF NOT EXISTS dev_spec_contents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dev_spec_id INTEGER NOT NULL REFERENCES project_dev_specs(id) ON DELETE CASCADE,
            content_type TEXT NOT NULL CHECK (content_type IN ('FIGMA', 'CHECKLIST', 'MMD', 'NOTE')),
            title TEXT,
            content TEXT NOT NULL DEFAULT '',
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        "organizations table",
        "CREATE TABLE IF NOT EXISTS organizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES organizations(id) ON DELETE CASCADE,
            sort_order INTEGER NOT NULL DEFAULT 0,
            depth INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        "users table",
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'ADMIN')),
            organization_id INTEGER REFERENCES organizations(id) ON DELETE SET NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        "index 'idx_dev_specs_sibling_name'",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_dev_specs_sibling_name
            ON project_dev_specs(COALESCE(parent_id, 0), name)",
    ),
    (
        "index 'idx_dev_specs_parent'",
        "CREATE INDEX IF NOT EXISTS idx_dev_specs_parent
            ON project_dev_specs(parent_id, sort_order)",
    ),
    (
        "index 'idx_contents_dev_spec'",
        "CREATE INDEX IF NOT EXISTS idx_contents_dev_spec
            ON dev_spec_contents(dev_spec_id, content_type, sort_order)",
    ),
    (
        "index 'idx_contents_singleton'",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_contents_singleton
            ON dev_spec_contents(dev_spec_id, content_type) WHERE content_type <> 'NOTE'",
    ),
    (
        "index 'idx_organizations_sibling_name'",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_organizations_sibling_name
            ON organizations(COALESCE(parent_id, 0), name)",
    ),
    (
        "index 'idx_organizations_parent'",
        "CREATE INDEX IF NOT EXISTS idx_organizations_parent
            ON organizations(parent_id, sort_order)",
    ),
    (
        "index 'idx_users_organization'",
        "CREATE INDEX IF NOT EXISTS idx_users_organization ON users(organization_id)",
    ),
];

/// Database service for managing libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use spectree_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("/path/to/spectree.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created, the
    /// connection fails or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;
        info!(path = %service.db_path.display(), "Database ready");

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements may return rows, so they go through query() instead
    /// of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        conn.query(pragma, ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call against an existing database.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        for (name, sql) in SCHEMA {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("Failed to create {}: {}", name, e))
            })?;
            debug!("Created {}", name);
        }

        Ok(())
    }

    /// Get a raw connection without per-connection pragmas
    ///
    /// Prefer [`DatabaseService::connect_with_timeout`] in async code.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with busy timeout and foreign keys configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }
}

/// Parse timestamp from database - handles both SQLite and RFC3339 formats
///
/// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(DatabaseError::row_decode(format!(
        "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
        s
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_timestamp_formats() {
        let sqlite = parse_timestamp("2024-03-01 12:30:00").unwrap();
        let rfc = parse_timestamp("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(sqlite, rfc);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_new_creates_parent_directory_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("spectree.db");

        let service = DatabaseService::new(db_path.clone()).await.unwrap();
        assert!(db_path.exists());

        let conn = service.connect_with_timeout().await.unwrap();
        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                (),
            )
            .await
            .unwrap();
        let mut tables = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            tables.push(row.get::<String>(0).unwrap());
        }
        for table in ["dev_spec_contents", "organizations", "project_dev_specs", "users"] {
            assert!(tables.iter().any(|t| t == table), "missing table {table}");
        }

        // reopening an initialized database is a no-op
        DatabaseService::new(db_path).await.unwrap();
    }
}
