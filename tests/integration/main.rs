//! Integration tests for PageScope
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! analyses end-to-end.

mod analysis_tests;
mod service_tests;

use pagescope::config::{
    AnalyzerConfig, Config, ServiceConfig, StorageConfig, UserAgentConfig,
};
use pagescope::Analyzer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration around the given database path
pub fn create_test_config(db_path: &str) -> Config {
    Config {
        analyzer: AnalyzerConfig {
            max_concurrent_probes: 8,
            fetch_timeout_ms: 5_000,
            probe_timeout_ms: 2_000,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
            summary_path: "./test_summary.md".to_string(),
        },
        service: ServiceConfig { workers: 2 },
    }
}

pub fn test_analyzer() -> Analyzer {
    Analyzer::new(&create_test_config(":memory:")).expect("Failed to build analyzer")
}

/// Serves `body` as an HTML page for GET requests on `route`
pub async fn mount_page(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.into())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Answers HEAD requests on `route` with `status`
pub async fn mount_head(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
