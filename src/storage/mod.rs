//! Storage module for persisting analysis records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Record creation on submission and status transitions
//! - Full overwrite of a record when its analysis finishes
//! - Deletion and requeueing

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{AnalysisStore, StorageError, StorageResult};

use crate::model::AnalysisResult;
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
///
/// The returned handle is the process-wide persistence collaborator: build
/// it once before the first analysis and drop it at shutdown.
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A persisted analysis with its identity and timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: i64,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub created_at: String,
    pub updated_at: String,
}
