//! HTTP fetcher implementation
//!
//! This module handles retrieval of the page under analysis:
//! - Building the shared HTTP client with a proper user agent string
//! - A single GET per analysis, bounded by a deadline, with no retry
//! - Error classification into transport and HTTP-status failures

use crate::config::UserAgentConfig;
use crate::{AnalysisError, AnalysisOutcome};
use reqwest::Client;
use std::time::Duration;

/// A successfully retrieved page
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code (always below 400)
    pub status_code: u16,

    /// Raw response body
    pub body: Vec<u8>,
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by the page fetch and every link probe of all
/// analyses; deadlines are applied per request rather than here.
///
/// # Example
///
/// ```no_run
/// use pagescope::config::UserAgentConfig;
/// use pagescope::analyzer::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageScope".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the target page
///
/// | Condition | Result |
/// |-----------|--------|
/// | DNS, connect, TLS failure | `AnalysisError::Transport` |
/// | Deadline exceeded | `AnalysisError::Transport` |
/// | Status >= 400 | `AnalysisError::HttpStatus` |
/// | Body read failure | `AnalysisError::Transport` |
///
/// The response is consumed or dropped on every path, which returns its
/// connection to the pool.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> AnalysisOutcome<FetchedPage> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport_error(url, &e))?;

    let status = response.status();
    if status.as_u16() >= 400 {
        tracing::info!("Received error status {} for {}", status, url);
        return Err(AnalysisError::HttpStatus {
            url: url.to_string(),
            status_code: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, &e))?;

    tracing::debug!(
        "Fetched {} ({} bytes, HTTP {})",
        final_url,
        body.len(),
        status.as_u16()
    );

    Ok(FetchedPage {
        final_url,
        status_code: status.as_u16(),
        body: body.to_vec(),
    })
}

/// Classifies a reqwest failure into a transport error message
fn transport_error(url: &str, error: &reqwest::Error) -> AnalysisError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };

    AnalysisError::Transport {
        url: url.to_string(),
        message,
    }
}
