//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the AnalysisStore trait.

use crate::model::{AnalysisResult, AnalysisStatus, BrokenLinkEntry, HeadingCounts, HtmlVersion};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{AnalysisStore, StorageError, StorageResult};
use crate::storage::AnalysisRecord;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "id, url, html_version, title, h1_count, h2_count, h3_count,
    h4_count, h5_count, h6_count, internal_links, external_links, login_form_detected,
    status, error_message, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_broken_links(&self, id: i64) -> StorageResult<Vec<BrokenLinkEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, status_code FROM broken_links WHERE analysis_id = ?1 ORDER BY id",
        )?;

        let links = stmt
            .query_map(params![id], |row| {
                Ok(BrokenLinkEntry {
                    url: row.get(0)?,
                    status_code: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn with_broken_links(&self, mut record: AnalysisRecord) -> StorageResult<AnalysisRecord> {
        record.analysis.broken_links = self.load_broken_links(record.id)?;
        Ok(record)
    }
}

/// Maps a row selected with `RECORD_COLUMNS`; broken links are loaded separately
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let heading_counts = HeadingCounts::from_levels([
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ]);

    Ok(AnalysisRecord {
        id: row.get(0)?,
        analysis: AnalysisResult {
            url: row.get(1)?,
            html_version: HtmlVersion::from_db_string(&row.get::<_, String>(2)?),
            title: row.get(3)?,
            heading_counts,
            internal_link_count: row.get(10)?,
            external_link_count: row.get(11)?,
            broken_links: Vec::new(),
            login_form_detected: row.get(12)?,
            status: AnalysisStatus::from_db_string(&row.get::<_, String>(13)?)
                .unwrap_or(AnalysisStatus::Error),
            error_message: row.get(14)?,
        },
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

impl AnalysisStore for SqliteStorage {
    fn create(&mut self, url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO analyses (url, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![url, AnalysisStatus::Queued.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: i64) -> StorageResult<AnalysisRecord> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM analyses WHERE id = ?1", RECORD_COLUMNS),
                params![id],
                record_from_row,
            )
            .optional()?
            .ok_or(StorageError::NotFound(id))?;

        self.with_broken_links(record)
    }

    fn list(&self) -> StorageResult<Vec<AnalysisRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM analyses ORDER BY id", RECORD_COLUMNS))?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        records
            .into_iter()
            .map(|record| self.with_broken_links(record))
            .collect()
    }

    fn mark_running(&mut self, id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE analyses SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![AnalysisStatus::Running.to_db_string(), now, id],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn save_result(&mut self, id: i64, result: &AnalysisResult) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let h = result.heading_counts.as_array();
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE analyses SET html_version = ?1, title = ?2,
             h1_count = ?3, h2_count = ?4, h3_count = ?5, h4_count = ?6, h5_count = ?7, h6_count = ?8,
             internal_links = ?9, external_links = ?10, broken_links = ?11,
             login_form_detected = ?12, status = ?13, error_message = ?14, updated_at = ?15
             WHERE id = ?16",
            params![
                result.html_version.to_db_string(),
                result.title,
                h[0],
                h[1],
                h[2],
                h[3],
                h[4],
                h[5],
                result.internal_link_count,
                result.external_link_count,
                result.broken_link_count(),
                result.login_form_detected,
                result.status.to_db_string(),
                result.error_message,
                now,
                id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(id));
        }

        tx.execute("DELETE FROM broken_links WHERE analysis_id = ?1", params![id])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO broken_links (analysis_id, url, status_code) VALUES (?1, ?2, ?3)",
            )?;
            for entry in &result.broken_links {
                insert.execute(params![id, entry.url, entry.status_code])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn requeue(&mut self, id: i64) -> StorageResult<AnalysisRecord> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE analyses SET status = ?1, error_message = NULL, updated_at = ?2 WHERE id = ?3",
            params![AnalysisStatus::Queued.to_db_string(), now, id],
        )?;

        if updated == 0 {
            return Err(StorageError::NotFound(id));
        }
        self.get(id)
    }

    fn delete(&mut self, id: i64) -> StorageResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM analyses WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    fn delete_many(&mut self, ids: &[i64]) -> StorageResult<u64> {
        if ids.is_empty() {
            return Err(StorageError::Validation("No IDs provided".to_string()));
        }

        let tx = self.conn.transaction()?;
        let mut deleted = 0u64;
        {
            let mut stmt = tx.prepare("DELETE FROM analyses WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute(params![id])? as u64;
            }
        }
        tx.commit()?;

        Ok(deleted)
    }

    // ===== Statistics =====

    fn count_by_status(&self, status: AnalysisStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM analyses WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_total(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
