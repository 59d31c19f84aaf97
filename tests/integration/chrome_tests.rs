//! Runs against a real Chromium and a local wiremock site
//!
//! Ignored by default since they need a browser; run with
//! `cargo test -- --ignored`, pointing `CHROME_BIN` at a binary if needed.

use crate::support::{test_config, urls};
use std::time::Duration;
use sumi_mirror::config::IdleStrategy;
use sumi_mirror::crawler::run_mirror;
use sumi_mirror::UrlState;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LATE_CONTENT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Late content</title></head>
<body>
<div id="app">loading</div>
<script>
  document.body.setAttribute("data-rendered", "yes");
  fetch("/api/greeting")
    .then(response => response.text())
    .then(text => { document.getElementById("app").textContent = text; });
</script>
</body>
</html>"#;

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(LATE_CONTENT_PAGE, "text/html"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/greeting"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hello from the api")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><h1>Guide</h1></body></html>", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn test_network_idle_captures_script_rendered_content() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = TempDir::new().unwrap();

    let mut config = test_config(dir.path());
    config.navigation.timeout_ms = 30_000;
    config.output.screenshots = true;
    let base = server.uri();
    let list = vec![format!("{}/", base), format!("{}/docs/guide", base)];

    let report = run_mirror(config, &list).await.unwrap();

    assert!(report.outcomes.iter().all(|o| o.state == UrlState::Done));

    let root = std::fs::read_to_string(dir.path().join("out/index.html")).unwrap();
    assert!(root.contains("data-rendered=\"yes\""));
    assert!(root.contains("hello from the api"));

    let guide = std::fs::read_to_string(dir.path().join("out/docs/guide/index.html")).unwrap();
    assert!(guide.contains("<h1>Guide</h1>"));

    let png = std::fs::read(dir.path().join("screenshots/docs/guide.png")).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
#[ignore = "requires a local Chromium"]
async fn test_unreachable_host_fails_after_retries() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.navigation.timeout_ms = 5_000;
    config.navigation.retries = 2;
    config.idle.strategy = IdleStrategy::Load;

    // Nothing listens on port 9 of localhost
    let report = run_mirror(config, &urls(&["http://127.0.0.1:9/"]))
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state, UrlState::FetchFailed);
    assert!(outcome.failure.is_some());
    assert!(!dir.path().join("out/index.html").exists());
}
