//! Structural inspection of a parsed document
//!
//! A single document-order walk extracts the title, the HTML version
//! signal, heading counts and login-form presence.

use crate::analyzer::Document;
use crate::model::{HeadingCounts, HtmlVersion};
use scraper::ElementRef;

/// Document-wide facts gathered in one traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureReport {
    /// Text of the first `title` element, trimmed; empty if none
    pub title: String,

    pub html_version: HtmlVersion,

    pub heading_counts: HeadingCounts,

    /// True if any `input type="password"` exists anywhere
    pub login_form_detected: bool,
}

/// Walks the document once and collects its structural facts
///
/// # Example
///
/// ```
/// use pagescope::analyzer::{analyze_structure, Document};
/// use pagescope::model::HtmlVersion;
///
/// let doc = Document::from_html("<html><title>T</title><h1>A</h1><h1>B</h1></html>");
/// let report = analyze_structure(&doc);
/// assert_eq!(report.title, "T");
/// assert_eq!(report.heading_counts.get(1), 2);
/// assert_eq!(report.html_version, HtmlVersion::Html5);
/// ```
pub fn analyze_structure(document: &Document) -> StructureReport {
    let mut title = None;
    let mut html_version = None;
    let mut heading_counts = HeadingCounts::default();
    let mut login_form_detected = false;

    for element in document.elements() {
        match element.value().name() {
            "title" if title.is_none() => {
                title = Some(element.text().collect::<String>().trim().to_string());
            }
            "html" if html_version.is_none() => {
                html_version = Some(detect_html_version(&element));
            }
            "input" if is_password_input(&element) => {
                login_form_detected = true;
            }
            name => {
                if let Some(level) = heading_level(name) {
                    heading_counts.increment(level);
                }
            }
        }
    }

    StructureReport {
        title: title.unwrap_or_default(),
        html_version: html_version.unwrap_or_default(),
        heading_counts,
        login_form_detected,
    }
}

/// Classifies the root `html` element
///
/// HTML5 documents are written without a namespace declaration; an
/// `xmlns` (or `xmlns:*`) attribute marks XHTML or another XML flavour,
/// which is reported as `Unknown`.
fn detect_html_version(element: &ElementRef<'_>) -> HtmlVersion {
    let declares_namespace = element
        .value()
        .attrs()
        .any(|(name, _)| name == "xmlns" || name.starts_with("xmlns:"));

    if declares_namespace {
        HtmlVersion::Unknown
    } else {
        HtmlVersion::Html5
    }
}

fn is_password_input(element: &ElementRef<'_>) -> bool {
    Document::attr(element, "type")
        .map(|t| t.trim().eq_ignore_ascii_case("password"))
        .unwrap_or(false)
}

/// Maps `h1`..`h6` to their level
fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}
