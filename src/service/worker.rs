//! Worker tasks that drain the analysis queue

use crate::analyzer::Analyzer;
use crate::service::lock_store;
use crate::storage::AnalysisStore;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// One queued analysis
#[derive(Debug, Clone)]
pub(crate) struct Job {
    pub id: i64,
    pub url: String,
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Takes jobs until the queue closes or the service is aborted
pub(crate) async fn run_worker<S: AnalysisStore>(
    index: usize,
    analyzer: Arc<Analyzer>,
    store: Arc<Mutex<S>>,
    jobs: SharedReceiver,
    cancel: CancellationToken,
) {
    tracing::debug!("Worker {} started", index);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = async { jobs.lock().await.recv().await } => job,
        };

        let Some(job) = next else {
            break;
        };

        process_job(&analyzer, &store, job, &cancel).await;
    }

    tracing::debug!("Worker {} stopped", index);
}

async fn process_job<S: AnalysisStore>(
    analyzer: &Analyzer,
    store: &Mutex<S>,
    job: Job,
    cancel: &CancellationToken,
) {
    let marked = lock_store(store).mark_running(job.id);
    if let Err(e) = marked {
        // Deleted between submission and pickup
        tracing::warn!("Skipping analysis {}: {}", job.id, e);
        return;
    }

    let result = analyzer.analyze_with_cancel(&job.url, cancel).await;

    let saved = lock_store(store).save_result(job.id, &result);
    match saved {
        Ok(()) => tracing::debug!("Saved analysis {} ({})", job.id, result.status),
        Err(e) => tracing::error!("Failed to save analysis {}: {}", job.id, e),
    }
}
