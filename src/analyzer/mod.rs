//! Single-page analysis pipeline
//!
//! This module contains the core analysis logic:
//! - Fetching the target page
//! - Parsing it into a document tree
//! - Structural inspection (title, headings, HTML version, login form)
//! - Link extraction and internal/external classification
//! - Concurrent liveness probing of every link
//! - Aggregation into one `AnalysisResult`

mod document;
mod fetcher;
mod links;
mod prober;
mod structure;

pub use document::Document;
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use links::{
    classify_href, extract_links, navigable_href, resolve_href, ExtractedLinks, LinkCandidate,
    LinkKind,
};
pub use prober::{probe_links, probe_url, ProbeOutcome, ProbeSettings};
pub use structure::{analyze_structure, StructureReport};

use crate::config::{AnalyzerConfig, Config};
use crate::model::{AnalysisResult, AnalysisStatus, BrokenLinkEntry};
use crate::{AnalysisError, AnalysisOutcome};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Runs analyses with a shared HTTP client
///
/// An `Analyzer` holds no per-run state, so one instance can serve any
/// number of concurrent analyses.
#[derive(Debug, Clone)]
pub struct Analyzer {
    client: Client,
    settings: AnalyzerConfig,
}

impl Analyzer {
    /// Creates an analyzer from the full configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::with_client(client, config.analyzer.clone()))
    }

    pub fn with_client(client: Client, settings: AnalyzerConfig) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &AnalyzerConfig {
        &self.settings
    }

    /// Analyzes one address
    ///
    /// Never fails: fetch, HTTP-status and parse failures come back as a
    /// result with `status == Error` and a message describing the stage.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pagescope::config::load_config;
    /// use pagescope::Analyzer;
    /// use std::path::Path;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = load_config(Path::new("pagescope.toml"))?;
    /// let analyzer = Analyzer::new(&config)?;
    /// let result = analyzer.analyze("https://example.com/").await;
    /// println!("{} broken links", result.broken_link_count());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn analyze(&self, address: &str) -> AnalysisResult {
        self.analyze_with_cancel(address, &CancellationToken::new())
            .await
    }

    /// Analyzes one address, giving up as soon as `cancel` fires
    ///
    /// Cancellation aborts the page fetch or every outstanding probe and
    /// yields an error result.
    pub async fn analyze_with_cancel(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        tracing::info!("Analyzing {}", address);

        match self.run(address, cancel).await {
            Ok(result) => {
                tracing::info!(
                    "Finished {}: {} internal, {} external, {} broken",
                    address,
                    result.internal_link_count,
                    result.external_link_count,
                    result.broken_link_count()
                );
                result
            }
            Err(e) => {
                tracing::warn!("Analysis of {} failed: {}", address, e);
                AnalysisResult::failed(address, e.to_string())
            }
        }
    }

    async fn run(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> AnalysisOutcome<AnalysisResult> {
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AnalysisError::Cancelled { url: address.to_string() });
            }
            fetched = fetch_page(&self.client, address, self.settings.fetch_timeout()) => fetched?,
        };

        let (structure, links) = inspect(address, &page.body)?;

        // Relative hrefs resolve against where the page actually came from
        let base = Url::parse(&page.final_url)
            .or_else(|_| Url::parse(address))
            .map_err(|e| AnalysisError::Transport {
                url: address.to_string(),
                message: format!("unusable page URL: {}", e),
            })?;

        let settings = ProbeSettings {
            max_in_flight: self.settings.max_concurrent_probes as usize,
            timeout: self.settings.probe_timeout(),
        };
        let broken = probe_links(&self.client, &base, &links.candidates, settings, cancel).await?;

        Ok(aggregate(address, structure, &links, broken))
    }
}

/// Parses the body and runs both document passes
///
/// Kept synchronous so the non-`Send` document is dropped before the
/// probe fan-out awaits.
fn inspect(address: &str, body: &[u8]) -> AnalysisOutcome<(StructureReport, ExtractedLinks)> {
    let document = Document::parse(address, body)?;
    let structure = analyze_structure(&document);
    let links = extract_links(&document, address);
    Ok((structure, links))
}

/// Merges the stage outputs into a finished result
pub fn aggregate(
    address: &str,
    structure: StructureReport,
    links: &ExtractedLinks,
    broken_links: Vec<BrokenLinkEntry>,
) -> AnalysisResult {
    AnalysisResult {
        url: address.to_string(),
        title: structure.title,
        html_version: structure.html_version,
        heading_counts: structure.heading_counts,
        internal_link_count: links.internal_count,
        external_link_count: links.external_count,
        broken_links,
        login_form_detected: structure.login_form_detected,
        status: AnalysisStatus::Done,
        error_message: None,
    }
}
