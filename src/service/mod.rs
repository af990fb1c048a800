//! Analysis queue
//!
//! Submissions are persisted as `queued` and handed to a fixed pool of
//! worker tasks through an mpsc channel, so a submitter never waits for
//! the analysis itself. Each worker:
//! 1. Marks the record `running`
//! 2. Runs the analyzer
//! 3. Overwrites the record with the result
//!
//! # Lifecycle
//!
//! Build the store before `start`; `shutdown` stops accepting work, drains
//! queued jobs and joins the workers; the store is released when the
//! service is dropped.

mod worker;

use crate::analyzer::Analyzer;
use crate::storage::{AnalysisRecord, AnalysisStore};
use crate::{PageScopeError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

pub(crate) use worker::Job;

/// Owns the job queue, the worker pool and the persistence handle
pub struct AnalysisService<S> {
    store: Arc<Mutex<S>>,
    jobs: Option<mpsc::UnboundedSender<Job>>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl<S> AnalysisService<S>
where
    S: AnalysisStore + Send + 'static,
{
    /// Starts `workers` worker tasks on the current Tokio runtime
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pagescope::config::load_config;
    /// use pagescope::storage::open_storage;
    /// use pagescope::{AnalysisService, Analyzer};
    /// use std::path::Path;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = load_config(Path::new("pagescope.toml"))?;
    /// let store = open_storage(Path::new(&config.storage.database_path))?;
    /// let mut service = AnalysisService::start(Analyzer::new(&config)?, store, 4);
    ///
    /// let id = service.submit("https://example.com/")?;
    /// service.shutdown().await;
    /// println!("{:?}", service.get(id)?.analysis.status);
    /// # Ok(())
    /// # }
    /// ```
    pub fn start(analyzer: Analyzer, store: S, workers: usize) -> Self {
        let store = Arc::new(Mutex::new(store));
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let analyzer = Arc::new(analyzer);

        let workers = (0..workers.max(1))
            .map(|index| {
                tokio::spawn(worker::run_worker(
                    index,
                    Arc::clone(&analyzer),
                    Arc::clone(&store),
                    Arc::clone(&rx),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::info!("Analysis service started");

        Self {
            store,
            jobs: Some(tx),
            workers,
            cancel,
        }
    }

    /// Persists a new `queued` record and enqueues its analysis
    ///
    /// Returns as soon as the record exists; the analysis runs later on a
    /// worker. Only absolute HTTP(S) addresses are accepted. Once the queue
    /// is closed nothing is persisted and `QueueClosed` is returned.
    pub fn submit(&self, url: &str) -> Result<i64> {
        let url = validate_target(url)?;
        let sender = self.open_queue()?;

        let id = self.store().create(&url)?;
        if sender.send(Job { id, url: url.clone() }).is_err() {
            // Workers went away between the check and the send
            self.store().delete(id)?;
            return Err(PageScopeError::QueueClosed);
        }

        tracing::info!("Queued analysis {} for {}", id, url);
        Ok(id)
    }

    /// Resets a record to `queued` and analyzes it again
    ///
    /// The new result fully overwrites the previous one. Once the queue is
    /// closed the record is left untouched and `QueueClosed` is returned.
    pub fn requeue(&self, id: i64) -> Result<AnalysisRecord> {
        let sender = self.open_queue()?;

        let previous = self.store().get(id)?;
        let record = self.store().requeue(id)?;
        let job = Job {
            id,
            url: record.analysis.url.clone(),
        };
        if sender.send(job).is_err() {
            self.store().save_result(id, &previous.analysis)?;
            return Err(PageScopeError::QueueClosed);
        }

        tracing::info!("Requeued analysis {} for {}", id, record.analysis.url);
        Ok(record)
    }

    pub fn get(&self, id: i64) -> Result<AnalysisRecord> {
        Ok(self.store().get(id)?)
    }

    pub fn list(&self) -> Result<Vec<AnalysisRecord>> {
        Ok(self.store().list()?)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        Ok(self.store().delete(id)?)
    }

    pub fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        Ok(self.store().delete_many(ids)?)
    }

    /// Runs a closure against the persistence handle
    pub fn with_store<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        f(&mut self.store())
    }

    /// Stops accepting submissions and waits for every queued job
    ///
    /// Reads keep working afterwards; `submit` and `requeue` fail with
    /// `QueueClosed` and leave storage unchanged.
    pub async fn shutdown(&mut self) {
        // Dropping the only sender lets workers drain the channel and exit
        self.jobs.take();

        // A handle is only removed once joined, so a dropped shutdown can be retried
        while let Some(handle) = self.workers.last_mut() {
            if let Err(e) = handle.await {
                tracing::error!("Analysis worker failed: {}", e);
            }
            self.workers.pop();
        }

        tracing::info!("Analysis service stopped");
    }

    /// Cancels in-flight analyses and stops workers from taking new jobs
    ///
    /// Cancelled analyses are saved with an error status; jobs that never
    /// started stay `queued`. Later submissions fail with `QueueClosed`.
    pub fn abort(&self) {
        tracing::warn!("Aborting in-flight analyses");
        self.cancel.cancel();
    }

    /// The job sender, unless shutdown, abort or worker exit closed the queue
    fn open_queue(&self) -> Result<&mpsc::UnboundedSender<Job>> {
        if self.cancel.is_cancelled() {
            return Err(PageScopeError::QueueClosed);
        }
        self.jobs
            .as_ref()
            .filter(|sender| !sender.is_closed())
            .ok_or(PageScopeError::QueueClosed)
    }

    fn store(&self) -> MutexGuard<'_, S> {
        lock_store(&self.store)
    }
}

pub(crate) fn lock_store<S>(store: &Mutex<S>) -> MutexGuard<'_, S> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Accepts only absolute HTTP(S) URLs, returned trimmed
fn validate_target(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed).map_err(|e| PageScopeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PageScopeError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(trimmed.to_string())
}
