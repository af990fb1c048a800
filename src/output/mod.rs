//! Output module for analysis reports
//!
//! This module handles:
//! - Human-readable rendering of a single analysis record
//! - Markdown reports over every stored analysis
//! - Aggregate statistics across analyses

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use stats::{load_statistics, print_statistics, AnalysisStatistics};

use crate::model::HeadingCounts;
use crate::storage::AnalysisRecord;

/// Renders one record as an indented multi-line report
pub fn render_record(record: &AnalysisRecord) -> String {
    let a = &record.analysis;
    let mut out = String::new();

    out.push_str(&format!("Analysis #{}: {}\n", record.id, a.url));
    out.push_str(&format!("  Status: {}\n", a.status));
    if let Some(message) = &a.error_message {
        out.push_str(&format!("  Error: {}\n", message));
    }
    out.push_str(&format!("  Title: {}\n", a.title));
    out.push_str(&format!("  HTML version: {}\n", a.html_version));
    out.push_str(&format!("  Headings: {}\n", format_headings(&a.heading_counts)));
    out.push_str(&format!(
        "  Links: {} internal, {} external, {} broken\n",
        a.internal_link_count,
        a.external_link_count,
        a.broken_link_count()
    ));
    out.push_str(&format!(
        "  Login form: {}\n",
        if a.login_form_detected { "yes" } else { "no" }
    ));

    for entry in &a.broken_links {
        if entry.is_transport_failure() {
            out.push_str(&format!("    - {} (unreachable)\n", entry.url));
        } else {
            out.push_str(&format!("    - {} (HTTP {})\n", entry.url, entry.status_code));
        }
    }

    out.push_str(&format!("  Updated: {}\n", record.updated_at));
    out
}

/// `h1=2 h2=0 ...`
pub fn format_headings(counts: &HeadingCounts) -> String {
    HeadingCounts::LEVELS
        .map(|level| format!("h{}={}", level, counts.get(level)))
        .collect::<Vec<_>>()
        .join(" ")
}
