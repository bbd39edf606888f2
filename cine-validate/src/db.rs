//! Database connection for cine-validate
//!
//! Validation only reads. The connection is opened read-only unless the
//! caller asked for the clean action, and it never creates a database file.

use crate::error::LoadError;
use sqlx::SqlitePool;
use std::path::Path;

/// Connection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    /// Required by the clean action
    ReadWrite,
}

impl AccessMode {
    fn sqlite_mode(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "ro",
            AccessMode::ReadWrite => "rw",
        }
    }
}

/// Connect to an existing database file
pub async fn connect(db_path: &Path, mode: AccessMode) -> Result<SqlitePool, LoadError> {
    if !db_path.exists() {
        return Err(LoadError::Unavailable(format!(
            "Database not found: {}\nRun the importer first to populate it.",
            db_path.display()
        )));
    }

    let db_url = format!("sqlite://{}?mode={}", db_path.display(), mode.sqlite_mode());
    let pool = SqlitePool::connect(&db_url).await?;

    Ok(pool)
}
