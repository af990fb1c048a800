//! End-to-end analyses against mock servers

use crate::{create_test_config, mount_head, mount_page, test_analyzer};
use pagescope::config::AnalyzerConfig;
use pagescope::{AnalysisStatus, Analyzer, BrokenLinkEntry, HtmlVersion};
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_title_and_headings() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "<html><head><title>Hello</title></head><body><h1>A</h1><h1>B</h1><h3>c</h3></body></html>",
    )
    .await;

    let result = test_analyzer().analyze(&format!("{}/", server.uri())).await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert_eq!(result.title, "Hello");
    assert_eq!(result.heading_counts.get(1), 2);
    assert_eq!(result.heading_counts.get(2), 0);
    assert_eq!(result.heading_counts.get(3), 1);
    assert_eq!(result.html_version, HtmlVersion::Html5);
    assert_eq!(result.internal_link_count, 0);
    assert_eq!(result.external_link_count, 0);
    assert!(result.broken_links.is_empty());
    assert!(!result.login_form_detected);
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn test_http_error_page_yields_error_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not here</title>"))
        .mount(&server)
        .await;

    let address = format!("{}/missing", server.uri());
    let result = test_analyzer().analyze(&address).await;

    assert_eq!(result.status, AnalysisStatus::Error);
    assert_eq!(result.url, address);
    assert_eq!(result.title, "");
    assert_eq!(result.heading_counts.total(), 0);
    assert_eq!(result.internal_link_count, 0);
    assert_eq!(result.external_link_count, 0);
    assert!(result.broken_links.is_empty());
    assert!(!result.login_form_detected);
    assert!(result.error_message.unwrap().contains("404"));
}

#[tokio::test]
async fn test_internal_and_unreachable_external_link() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/about">About</a><a href="http://127.0.0.1:9/">Down</a></body></html>"#,
    )
    .await;
    mount_head(&server, "/about", 200).await;

    let result = test_analyzer().analyze(&format!("{}/", server.uri())).await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert_eq!(result.internal_link_count, 1);
    assert_eq!(result.external_link_count, 1);
    assert_eq!(result.broken_links.len(), 1);
    assert!(result
        .broken_links
        .contains(&BrokenLinkEntry::new("http://127.0.0.1:9/", 0)));
}

#[tokio::test]
async fn test_head_error_status_is_recorded() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/gone">Gone</a><a href="/here">Here</a>"#).await;
    mount_head(&server, "/gone", 404).await;
    mount_head(&server, "/here", 204).await;

    let result = test_analyzer().analyze(&format!("{}/", server.uri())).await;

    assert_eq!(
        result.broken_links,
        vec![BrokenLinkEntry::new(format!("{}/gone", server.uri()), 404)]
    );
}

#[tokio::test]
async fn test_many_probes_collect_exact_broken_set() {
    let server = MockServer::start().await;

    let mut body = String::from("<html><body>");
    for i in 0..25 {
        body.push_str(&format!(r#"<a href="/ok/{i}">ok</a><a href="/dead/{i}">dead</a>"#));
    }
    body.push_str("</body></html>");
    mount_page(&server, "/", body).await;

    Mock::given(method("HEAD"))
        .and(path_regex("^/ok/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(20)))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path_regex("^/dead/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = test_analyzer().analyze(&format!("{}/", server.uri())).await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert_eq!(result.internal_link_count, 50);
    assert_eq!(result.broken_links.len(), 25);

    let found: HashSet<BrokenLinkEntry> = result.broken_links.into_iter().collect();
    let expected: HashSet<BrokenLinkEntry> = (0..25)
        .map(|i| BrokenLinkEntry::new(format!("{}/dead/{}", server.uri(), i), 503))
        .collect();
    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_concurrent_analyses_are_independent() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<title>Shared</title><a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#,
    )
    .await;
    mount_head(&server, "/a", 200).await;
    mount_head(&server, "/b", 404).await;
    mount_head(&server, "/c", 500).await;

    let analyzer = test_analyzer();
    let address = format!("{}/", server.uri());
    let (first, second) = tokio::join!(analyzer.analyze(&address), analyzer.analyze(&address));

    for result in [&first, &second] {
        assert_eq!(result.status, AnalysisStatus::Done);
        assert_eq!(result.title, "Shared");
        assert_eq!(result.internal_link_count, 3);
        assert_eq!(result.broken_links.len(), 2);
    }

    let first_set: HashSet<_> = first.broken_links.iter().cloned().collect();
    let second_set: HashSet<_> = second.broken_links.iter().cloned().collect();
    assert_eq!(first_set, second_set);
}

#[tokio::test]
async fn test_slow_probe_times_out_as_unreachable() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/slow">slow</a>"#).await;
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let settings = AnalyzerConfig {
        probe_timeout_ms: 200,
        ..AnalyzerConfig::default()
    };
    let analyzer = Analyzer::with_client(reqwest::Client::new(), settings);

    let result = analyzer.analyze(&format!("{}/", server.uri())).await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert_eq!(
        result.broken_links,
        vec![BrokenLinkEntry::new(format!("{}/slow", server.uri()), 0)]
    );
}

#[tokio::test]
async fn test_relative_links_resolve_against_redirect_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/docs/index.html", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/docs/index.html", r#"<a href="page2.html">next</a>"#).await;
    mount_head(&server, "/docs/page2.html", 200).await;

    let address = format!("{}/start", server.uri());
    let result = test_analyzer().analyze(&address).await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert_eq!(result.url, address);
    assert!(result.broken_links.is_empty());
}

#[tokio::test]
async fn test_login_form_and_skipped_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/login",
        r##"<html><body>
            <a href="#">top</a><a href="  ">blank</a><a href="javascript:void(0)">js</a>
            <form action="/session"><input name="user"><input type="password" name="pw"></form>
        </body></html>"##,
    )
    .await;

    let result = test_analyzer()
        .analyze(&format!("{}/login", server.uri()))
        .await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert!(result.login_form_detected);
    assert_eq!(result.total_link_count(), 0);
    assert!(result.broken_links.is_empty());
}

#[tokio::test]
async fn test_xhtml_namespace_is_unknown_version() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html xmlns="http://www.w3.org/1999/xhtml"><head><title>X</title></head></html>"#,
    )
    .await;

    let result = test_analyzer().analyze(&format!("{}/", server.uri())).await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert_eq!(result.html_version, HtmlVersion::Unknown);
}

#[tokio::test]
async fn test_requests_carry_configured_user_agent() {
    let server = MockServer::start().await;
    let agent = create_test_config(":memory:").user_agent.header_value();
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", agent.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>ok</title>"))
        .mount(&server)
        .await;

    let result = test_analyzer().analyze(&format!("{}/", server.uri())).await;

    assert_eq!(result.status, AnalysisStatus::Done);
    assert_eq!(result.title, "ok");
}

#[tokio::test]
async fn test_cancel_during_probing_yields_error_result() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/hang">a</a><a href="/stall">b</a>"#).await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let cancel = tokio_util::sync::CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = test_analyzer()
        .analyze_with_cancel(&format!("{}/", server.uri()), &cancel)
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.status, AnalysisStatus::Error);
    assert!(result.error_message.unwrap().contains("cancelled"));
    assert_eq!(result.internal_link_count, 0);
    assert!(result.broken_links.is_empty());
}
