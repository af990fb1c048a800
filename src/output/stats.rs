//! Statistics across stored analyses
//!
//! This module provides functionality for extracting and displaying
//! aggregate numbers from the storage layer.

use crate::model::AnalysisStatus;
use crate::storage::{AnalysisStore, StorageResult};
use std::collections::HashMap;

/// Aggregate numbers over every stored analysis
#[derive(Debug, Clone, Default)]
pub struct AnalysisStatistics {
    /// Total number of analyses
    pub total_analyses: u64,

    /// Count of analyses by status
    pub by_status: HashMap<AnalysisStatus, u64>,

    /// Link totals over finished analyses
    pub internal_links: u64,
    pub external_links: u64,
    pub broken_links: u64,

    /// Finished analyses whose page contains a password input
    pub login_forms: u64,
}

impl AnalysisStatistics {
    pub fn count(&self, status: AnalysisStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Share of links that failed their probe, in percent
    pub fn broken_rate(&self) -> f64 {
        let total = self.internal_links + self.external_links;
        if total == 0 {
            0.0
        } else {
            self.broken_links as f64 / total as f64 * 100.0
        }
    }
}

/// Loads statistics from storage
pub fn load_statistics(store: &dyn AnalysisStore) -> StorageResult<AnalysisStatistics> {
    let mut stats = AnalysisStatistics {
        total_analyses: store.count_total()?,
        ..Default::default()
    };

    for status in AnalysisStatus::all() {
        let count = store.count_by_status(status)?;
        if count > 0 {
            stats.by_status.insert(status, count);
        }
    }

    for record in store.list()? {
        let a = &record.analysis;
        if a.status != AnalysisStatus::Done {
            continue;
        }
        stats.internal_links += u64::from(a.internal_link_count);
        stats.external_links += u64::from(a.external_link_count);
        stats.broken_links += u64::from(a.broken_link_count());
        if a.login_form_detected {
            stats.login_forms += 1;
        }
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &AnalysisStatistics) {
    println!("=== Analysis Statistics ===\n");

    println!("Overview:");
    println!("  Total analyses: {}", stats.total_analyses);
    for status in AnalysisStatus::all() {
        println!("  {}: {}", status, stats.count(status));
    }
    println!();

    println!("Links (finished analyses):");
    println!("  Internal: {}", stats.internal_links);
    println!("  External: {}", stats.external_links);
    println!(
        "  Broken: {} ({:.1}%)",
        stats.broken_links,
        stats.broken_rate()
    );
    println!();

    println!("Pages with login forms: {}", stats.login_forms);
}
