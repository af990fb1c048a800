//! Queue, persistence and reporting through the analysis service

use crate::{create_test_config, mount_head, mount_page};
use pagescope::output::{format_markdown_report, load_statistics};
use pagescope::storage::{open_storage, AnalysisRecord, SqliteStorage};
use pagescope::{AnalysisService, AnalysisStatus, AnalysisStore, Analyzer, PageScopeError};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn start_service(dir: &TempDir) -> AnalysisService<SqliteStorage> {
    start_service_with_workers(dir, 2)
}

fn start_service_with_workers(dir: &TempDir, workers: usize) -> AnalysisService<SqliteStorage> {
    let db_path = dir.path().join("analyses.db");
    let config = create_test_config(db_path.to_str().unwrap());
    let storage = open_storage(&db_path).expect("Failed to open storage");
    let analyzer = Analyzer::new(&config).expect("Failed to build analyzer");
    AnalysisService::start(analyzer, storage, workers)
}

/// Polls until the record's status satisfies `done`
async fn wait_for(
    service: &AnalysisService<SqliteStorage>,
    id: i64,
    done: impl Fn(AnalysisStatus) -> bool,
) -> AnalysisRecord {
    for _ in 0..200 {
        let record = service.get(id).unwrap();
        if done(record.analysis.status) {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("analysis {} never reached the expected status", id);
}

/// Polls until the record reaches `done` or `error`
async fn wait_for_terminal(service: &AnalysisService<SqliteStorage>, id: i64) -> AnalysisRecord {
    wait_for(service, id, |status| status.is_terminal()).await
}

#[tokio::test]
async fn test_submit_persists_finished_result() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<title>Stored</title><h2>x</h2><a href="/a">a</a><a href="/b">b</a>"#,
    )
    .await;
    mount_head(&server, "/a", 200).await;
    mount_head(&server, "/b", 410).await;

    let dir = TempDir::new().unwrap();
    let mut service = start_service(&dir);

    let address = format!("{}/", server.uri());
    let id = service.submit(&address).unwrap();
    let queued = service.get(id).unwrap();
    assert_eq!(queued.analysis.url, address);

    service.shutdown().await;

    let record = service.get(id).unwrap();
    assert_eq!(record.analysis.status, AnalysisStatus::Done);
    assert_eq!(record.analysis.title, "Stored");
    assert_eq!(record.analysis.heading_counts.get(2), 1);
    assert_eq!(record.analysis.internal_link_count, 2);
    assert_eq!(record.analysis.broken_links.len(), 1);
    assert_eq!(record.analysis.broken_links[0].status_code, 410);
}

#[tokio::test]
async fn test_failed_fetch_is_stored_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut service = start_service(&dir);
    let id = service.submit(&format!("{}/broken", server.uri())).unwrap();
    service.shutdown().await;

    let record = service.get(id).unwrap();
    assert_eq!(record.analysis.status, AnalysisStatus::Error);
    assert!(record.analysis.error_message.unwrap().contains("500"));
    assert_eq!(record.analysis.title, "");
}

#[tokio::test]
async fn test_requeue_overwrites_previous_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<title>First</title><a href="/old">old</a>"#),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Second</title>"))
        .mount(&server)
        .await;
    mount_head(&server, "/old", 404).await;

    let dir = TempDir::new().unwrap();
    let mut service = start_service(&dir);
    let id = service.submit(&format!("{}/", server.uri())).unwrap();

    let first = wait_for_terminal(&service, id).await;
    assert_eq!(first.analysis.title, "First");
    assert_eq!(first.analysis.broken_links.len(), 1);

    let requeued = service.requeue(id).unwrap();
    assert_eq!(requeued.id, id);

    service.shutdown().await;

    let second = service.get(id).unwrap();
    assert_eq!(second.analysis.status, AnalysisStatus::Done);
    assert_eq!(second.analysis.title, "Second");
    assert_eq!(second.analysis.internal_link_count, 0);
    assert!(second.analysis.broken_links.is_empty());
    assert_eq!(service.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_results_survive_reopen() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<title>Durable</title>").await;

    let dir = TempDir::new().unwrap();
    let id = {
        let mut service = start_service(&dir);
        let id = service.submit(&format!("{}/", server.uri())).unwrap();
        service.shutdown().await;
        id
    };

    let storage = open_storage(&dir.path().join("analyses.db")).unwrap();
    let record = storage.get(id).unwrap();
    assert_eq!(record.analysis.title, "Durable");
    assert_eq!(record.analysis.status, AnalysisStatus::Done);
}

#[tokio::test]
async fn test_delete_and_statistics() {
    let server = MockServer::start().await;
    mount_page(&server, "/one", r#"<a href="/x">x</a>"#).await;
    mount_page(&server, "/two", "<title>two</title>").await;
    mount_page(&server, "/three", "<title>three</title>").await;
    mount_head(&server, "/x", 404).await;

    let dir = TempDir::new().unwrap();
    let mut service = start_service(&dir);
    let one = service.submit(&format!("{}/one", server.uri())).unwrap();
    let two = service.submit(&format!("{}/two", server.uri())).unwrap();
    let three = service.submit(&format!("{}/three", server.uri())).unwrap();
    service.shutdown().await;

    let stats = service.with_store(|store| load_statistics(&*store)).unwrap();
    assert_eq!(stats.total_analyses, 3);
    assert_eq!(stats.count(AnalysisStatus::Done), 3);
    assert_eq!(stats.internal_links, 1);
    assert_eq!(stats.broken_links, 1);

    let report = format_markdown_report(&service.list().unwrap());
    assert!(report.contains(&format!("{}/x", server.uri())));

    service.delete(one).unwrap();
    assert_eq!(service.delete_many(&[two, three, 999]).unwrap(), 2);
    assert!(service.list().unwrap().is_empty());
    assert!(matches!(service.get(one), Err(PageScopeError::Storage(_))));
}

#[tokio::test]
async fn test_abort_cancels_running_and_keeps_pending_queued() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<title>late</title>")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut service = start_service_with_workers(&dir, 1);
    let running = service.submit(&format!("{}/first", server.uri())).unwrap();
    let pending_a = service.submit(&format!("{}/second", server.uri())).unwrap();
    let pending_b = service.submit(&format!("{}/third", server.uri())).unwrap();

    wait_for(&service, running, |status| status == AnalysisStatus::Running).await;

    service.abort();
    service.shutdown().await;

    let cancelled = service.get(running).unwrap();
    assert_eq!(cancelled.analysis.status, AnalysisStatus::Error);
    assert!(cancelled.analysis.error_message.unwrap().contains("cancelled"));

    for id in [pending_a, pending_b] {
        assert_eq!(service.get(id).unwrap().analysis.status, AnalysisStatus::Queued);
    }

    assert!(matches!(
        service.submit(&format!("{}/fourth", server.uri())),
        Err(PageScopeError::QueueClosed)
    ));
    assert_eq!(service.list().unwrap().len(), 3);
}
