//! PageScope: a single-page web analyzer
//!
//! This crate fetches one webpage and reports its title, heading census,
//! HTML version, internal/external link split, login-form presence and the
//! liveness of every link it contains.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod output;
pub mod service;
pub mod storage;

use thiserror::Error;

/// Main error type for PageScope operations
#[derive(Debug, Error)]
pub enum PageScopeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Analysis queue is closed")]
    QueueClosed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stage failures that end an analysis run
///
/// Every variant is terminal for the run and surfaces only as an
/// `error` status on the result. Per-link probe failures are never
/// represented here; they are recorded as broken links instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status_code} for {url}")]
    HttpStatus { url: String, status_code: u16 },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Analysis of {url} was cancelled")]
    Cancelled { url: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for PageScope operations
pub type Result<T> = std::result::Result<T, PageScopeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for a single analysis stage
pub type AnalysisOutcome<T> = std::result::Result<T, AnalysisError>;

// Re-export commonly used types
pub use analyzer::Analyzer;
pub use config::Config;
pub use model::{AnalysisResult, AnalysisStatus, BrokenLinkEntry, HeadingCounts, HtmlVersion};
pub use service::AnalysisService;
pub use storage::{AnalysisStore, SqliteStorage};
