//! Concurrent link liveness probing
//!
//! Every candidate gets its own task in a `JoinSet`; a per-run semaphore
//! caps how many HEAD requests are in flight. Failures are appended to a
//! shared accumulator under a mutex and read back only after every task
//! has been joined.

use crate::analyzer::links::{resolve_href, LinkCandidate};
use crate::model::BrokenLinkEntry;
use crate::{AnalysisError, AnalysisOutcome};
use reqwest::Client;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Limits applied to the probes of one analysis run
#[derive(Debug, Clone, Copy)]
pub struct ProbeSettings {
    /// Maximum probes in flight at once
    pub max_in_flight: usize,

    /// Deadline for each probe
    pub timeout: Duration,
}

/// Outcome of a single liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Response status below 400
    Alive(u16),

    /// Response status 400 or above
    Dead(u16),

    /// No HTTP response (DNS, connect, TLS, timeout, unusable URL)
    Unreachable,
}

impl ProbeOutcome {
    /// Status code recorded for a broken link, None if the link is alive
    pub fn broken_status(&self) -> Option<u16> {
        match self {
            Self::Alive(_) => None,
            Self::Dead(code) => Some(*code),
            Self::Unreachable => Some(0),
        }
    }
}

/// Sends a HEAD request and classifies the response
pub async fn probe_url(client: &Client, url: &str, timeout: Duration) -> ProbeOutcome {
    match client.head(url).timeout(timeout).send().await {
        Ok(response) => {
            let code = response.status().as_u16();
            if code >= 400 {
                ProbeOutcome::Dead(code)
            } else {
                ProbeOutcome::Alive(code)
            }
        }
        Err(e) => {
            tracing::debug!("Probe of {} failed: {}", url, e);
            ProbeOutcome::Unreachable
        }
    }
}

/// Probes every candidate concurrently and returns the broken ones
///
/// Relative hrefs are resolved against `base`. The returned entries are in
/// completion order, which is not deterministic. A probe failure never
/// fails the run; the only error is cancellation, in which case every
/// outstanding probe is aborted.
pub async fn probe_links(
    client: &Client,
    base: &Url,
    candidates: &[LinkCandidate],
    settings: ProbeSettings,
    cancel: &CancellationToken,
) -> AnalysisOutcome<Vec<BrokenLinkEntry>> {
    let broken: Arc<Mutex<Vec<BrokenLinkEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let permits = Arc::new(Semaphore::new(settings.max_in_flight.max(1)));
    let mut probes = JoinSet::new();

    for candidate in candidates {
        let target = resolve_href(&candidate.href, base);
        let reported = target
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| candidate.href.clone());

        let client = client.clone();
        let broken = Arc::clone(&broken);
        let permits = Arc::clone(&permits);
        let timeout = settings.timeout;

        probes.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };

            let outcome = match target {
                Some(url) => probe_url(&client, url.as_str(), timeout).await,
                None => ProbeOutcome::Unreachable,
            };

            if let Some(status_code) = outcome.broken_status() {
                tracing::debug!("Broken link {} (status {})", reported, status_code);
                broken
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(BrokenLinkEntry::new(reported, status_code));
            }
        });
    }

    // Join barrier: nothing reads the accumulator until every probe is done
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Cancelling {} outstanding probes for {}", probes.len(), base);
                probes.abort_all();
                return Err(AnalysisError::Cancelled { url: base.to_string() });
            }
            joined = probes.join_next() => match joined {
                Some(Ok(())) => {}
                Some(Err(e)) => tracing::warn!("Probe task for {} failed: {}", base, e),
                None => break,
            },
        }
    }

    let entries = std::mem::take(&mut *broken.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(entries)
}
