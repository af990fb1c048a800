//! Markdown report generation
//!
//! This module generates a human-readable markdown report of every stored
//! analysis: a summary table followed by the broken links of each page.

use crate::output::format_headings;
use crate::storage::AnalysisRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report of the given records
///
/// # Arguments
///
/// * `records` - The analyses to include, in display order
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_report(records: &[AnalysisRecord], output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_report(records);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats records as a markdown report
pub fn format_markdown_report(records: &[AnalysisRecord]) -> String {
    let mut md = String::new();

    md.push_str("# PageScope Analysis Report\n\n");
    md.push_str(&format!("- **Analyses**: {}\n\n", records.len()));

    md.push_str("## Summary\n\n");
    md.push_str("| ID | URL | Status | Title | HTML | Internal | External | Broken | Login |\n");
    md.push_str("|----|-----|--------|-------|------|----------|----------|--------|-------|\n");
    for record in records {
        let a = &record.analysis;
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            record.id,
            escape_cell(&a.url),
            a.status,
            escape_cell(&a.title),
            a.html_version,
            a.internal_link_count,
            a.external_link_count,
            a.broken_link_count(),
            if a.login_form_detected { "yes" } else { "no" }
        ));
    }
    md.push('\n');

    md.push_str("## Details\n\n");
    for record in records {
        let a = &record.analysis;
        md.push_str(&format!("### #{} {}\n\n", record.id, a.url));
        md.push_str(&format!("- **Status**: {}\n", a.status));
        if let Some(message) = &a.error_message {
            md.push_str(&format!("- **Error**: {}\n", message));
        }
        md.push_str(&format!("- **Headings**: {}\n", format_headings(&a.heading_counts)));
        md.push_str(&format!("- **Updated**: {}\n\n", record.updated_at));

        if !a.broken_links.is_empty() {
            md.push_str("| Broken link | Status |\n");
            md.push_str("|-------------|--------|\n");
            for entry in &a.broken_links {
                let status = if entry.is_transport_failure() {
                    "unreachable".to_string()
                } else {
                    entry.status_code.to_string()
                };
                md.push_str(&format!("| {} | {} |\n", escape_cell(&entry.url), status));
            }
            md.push('\n');
        }
    }

    md
}

/// Keeps cell text from breaking the table layout
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
