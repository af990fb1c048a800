//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{AnalysisResult, AnalysisStatus};
use crate::storage::AnalysisRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Analysis not found: {0}")]
    NotFound(i64),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator for analysis records
///
/// The service layer owns one handle and serializes access to it, so
/// implementations only need to be `Send`.
pub trait AnalysisStore {
    /// Creates a record for a submitted address with status `queued`
    ///
    /// # Returns
    ///
    /// The ID of the newly created record
    fn create(&mut self, url: &str) -> StorageResult<i64>;

    /// Gets a record by ID
    fn get(&self, id: i64) -> StorageResult<AnalysisRecord>;

    /// Gets every record, oldest first
    fn list(&self) -> StorageResult<Vec<AnalysisRecord>>;

    /// Marks a record as picked up by a worker
    fn mark_running(&mut self, id: i64) -> StorageResult<()>;

    /// Overwrites every analysis field of a record, broken links included
    fn save_result(&mut self, id: i64, result: &AnalysisResult) -> StorageResult<()>;

    /// Resets a record to `queued` so it can be analyzed again
    fn requeue(&mut self, id: i64) -> StorageResult<AnalysisRecord>;

    /// Deletes one record
    fn delete(&mut self, id: i64) -> StorageResult<()>;

    /// Deletes several records
    ///
    /// # Returns
    ///
    /// The number of records actually deleted
    fn delete_many(&mut self, ids: &[i64]) -> StorageResult<u64>;

    // ===== Statistics =====

    /// Counts records in a given status
    fn count_by_status(&self, status: AnalysisStatus) -> StorageResult<u64>;

    /// Gets total record count
    fn count_total(&self) -> StorageResult<u64>;
}
