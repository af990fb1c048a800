//! Parsed document model
//!
//! Thin layer over `scraper::Html` exposing the lookups the analysis needs:
//! first element by tag, all elements by tag, document-order traversal and
//! attribute access.
//!
//! `Html` is not `Send`, so a `Document` must never be held across an
//! `.await` in code that runs on a spawned task.

use crate::{AnalysisError, AnalysisOutcome};
use scraper::{ElementRef, Html, Selector};

/// How many leading bytes are sniffed for binary content
const SNIFF_LEN: usize = 1024;

/// A parsed HTML document owned by one analysis run
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a response body into a document tree
    ///
    /// The HTML parser recovers from any malformed markup, so the only
    /// rejected input is a body that is not text at all (a NUL byte within
    /// the first 1024 bytes). Invalid UTF-8 sequences are replaced.
    ///
    /// # Example
    ///
    /// ```
    /// use pagescope::analyzer::Document;
    ///
    /// let doc = Document::parse("https://example.com/", b"<title>Hi</title>").unwrap();
    /// assert!(doc.find_first("title").is_some());
    /// ```
    pub fn parse(url: &str, body: &[u8]) -> AnalysisOutcome<Self> {
        let sniffed = &body[..body.len().min(SNIFF_LEN)];
        if sniffed.contains(&0) {
            return Err(AnalysisError::Parse {
                url: url.to_string(),
                message: "response body is binary, not HTML".to_string(),
            });
        }

        let text = String::from_utf8_lossy(body);
        let html = Html::parse_document(&text);

        if !html.errors.is_empty() {
            tracing::debug!(
                "Recovered from {} HTML parse errors in {}",
                html.errors.len(),
                url
            );
        }

        Ok(Self { html })
    }

    /// Parses a markup string; never fails
    pub fn from_html(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// First element with the given tag name in document order
    pub fn find_first(&self, tag: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(tag).ok()?;
        self.html.select(&selector).next()
    }

    /// Every element with the given tag name in document order
    pub fn find_all(&self, tag: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(tag) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Every element in document order, starting at the root `html` element
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    /// Attribute value on an element, if present
    pub fn attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
        element.value().attr(name)
    }
}
