//! Hyperlink extraction and internal/external classification

use crate::analyzer::Document;
use url::Url;

/// Which side of the target a link points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Internal,
    External,
}

/// A navigable href taken from one anchor element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Trimmed href as written in the document
    pub href: String,

    pub kind: LinkKind,
}

/// Navigable links of a document and their classification totals
#[derive(Debug, Clone, Default)]
pub struct ExtractedLinks {
    pub candidates: Vec<LinkCandidate>,
    pub internal_count: u32,
    pub external_count: u32,
}

impl ExtractedLinks {
    fn push(&mut self, candidate: LinkCandidate) {
        match candidate.kind {
            LinkKind::Internal => self.internal_count += 1,
            LinkKind::External => self.external_count += 1,
        }
        self.candidates.push(candidate);
    }
}

/// Extracts and classifies the href of every `<a href>` in the document
///
/// **Skipped** (after trimming surrounding whitespace):
/// - empty hrefs
/// - fragment-only hrefs (`#`, `#section`)
/// - `javascript:` pseudo-links
///
/// Every other href counts exactly once as internal or external; duplicate
/// hrefs are counted and probed once per anchor.
///
/// # Example
///
/// ```
/// use pagescope::analyzer::{extract_links, Document};
///
/// let doc = Document::from_html(
///     r##"<a href="/about">A</a><a href="http://external.example/x">B</a><a href="#top">C</a>"##,
/// );
/// let links = extract_links(&doc, "https://example.com");
/// assert_eq!(links.internal_count, 1);
/// assert_eq!(links.external_count, 1);
/// ```
pub fn extract_links(document: &Document, target: &str) -> ExtractedLinks {
    let mut links = ExtractedLinks::default();

    for anchor in document.find_all("a") {
        let Some(raw) = Document::attr(&anchor, "href") else {
            continue;
        };

        if let Some(href) = navigable_href(raw) {
            links.push(LinkCandidate {
                href: href.to_string(),
                kind: classify_href(href, target),
            });
        }
    }

    tracing::debug!(
        "Extracted {} links from {} ({} internal, {} external)",
        links.candidates.len(),
        target,
        links.internal_count,
        links.external_count
    );

    links
}

/// Returns the trimmed href if it is navigable
pub fn navigable_href(raw: &str) -> Option<&str> {
    let href = raw.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let is_javascript = href
        .get(..11)
        .map(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
        .unwrap_or(false);
    if is_javascript {
        return None;
    }

    Some(href)
}

/// Classifies an href relative to the target address
///
/// This is a deliberately loose heuristic, not an origin comparison: a
/// root-relative href (`/...`, which also matches protocol-relative
/// `//host/...`) or any href containing the target address as a substring
/// is internal. Everything else, including path-relative hrefs such as
/// `about.html`, is external.
pub fn classify_href(href: &str, target: &str) -> LinkKind {
    if href.starts_with('/') || href.contains(target) {
        LinkKind::Internal
    } else {
        LinkKind::External
    }
}

/// Resolves an href against the page it was found on
///
/// Returns None when the href cannot be joined to the base or resolves to
/// a scheme other than HTTP(S).
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
