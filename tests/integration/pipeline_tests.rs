//! End-to-end runs of the coordinator against a scripted session

use crate::support::{default_page, snapshot_tree, test_config, urls, FakeSession, Step};
use std::path::PathBuf;
use sumi_mirror::config::parse_config;
use sumi_mirror::{Coordinator, FailureKind, MirrorError, UrlState};
use tempfile::TempDir;

#[tokio::test]
async fn test_failing_url_does_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let failing = "https://example.com/down";
    let working = "https://example.com/up";
    let session = FakeSession::new().always_failing(failing, 3);
    let mut coordinator = Coordinator::new(test_config(dir.path()), session);

    let report = coordinator.run(&urls(&[failing, working])).await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].state, UrlState::FetchFailed);
    assert_eq!(report.outcomes[0].attempts, 3);
    assert_eq!(
        report.outcomes[0].failure.as_ref().unwrap().kind,
        FailureKind::Navigation
    );
    assert_eq!(report.outcomes[1].state, UrlState::Done);

    assert_eq!(coordinator.session().navigations_to(failing), 3);
    assert!(!dir.path().join("out/down/index.html").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/up/index.html")).unwrap(),
        default_page(working)
    );
}

#[tokio::test]
async fn test_transient_timeouts_are_retried() {
    let dir = TempDir::new().unwrap();
    let url = "https://example.com/slow";
    let session = FakeSession::new().script(
        url,
        vec![
            Step::Timeout,
            Step::Timeout,
            Step::Page("<html>finally</html>".to_string()),
        ],
    );
    let mut coordinator = Coordinator::new(test_config(dir.path()), session);

    let report = coordinator.run(&urls(&[url])).await.unwrap();

    assert_eq!(report.outcomes[0].state, UrlState::Done);
    assert_eq!(report.outcomes[0].attempts, 3);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/slow/index.html")).unwrap(),
        "<html>finally</html>"
    );
}

#[tokio::test]
async fn test_timeouts_beyond_budget_fail_the_url() {
    let dir = TempDir::new().unwrap();
    let url = "https://example.com/slow";
    let session = FakeSession::new().script(
        url,
        vec![
            Step::Timeout,
            Step::Timeout,
            Step::Page("<html>too late</html>".to_string()),
        ],
    );
    let mut config = test_config(dir.path());
    config.navigation.retries = 2;
    let mut coordinator = Coordinator::new(config, session);

    let report = coordinator.run(&urls(&[url])).await.unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state, UrlState::FetchFailed);
    assert_eq!(
        outcome.failure.as_ref().unwrap().kind,
        FailureKind::NavigationTimeout
    );
    assert_eq!(coordinator.session().navigations_to(url), 2);
}

#[tokio::test]
async fn test_saved_html_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let url = "https://example.com/docs/guide";
    let html = "<!DOCTYPE html>\r\n<html lang=\"ja\"><body>墨 \u{00e9}\u{0301} \u{FEFF}</body></html>\n";
    let session = FakeSession::new().script(url, vec![Step::Page(html.to_string())]);
    let mut coordinator = Coordinator::new(test_config(dir.path()), session);

    coordinator.run(&urls(&[url])).await.unwrap();

    let saved = std::fs::read(dir.path().join("out/docs/guide/index.html")).unwrap();
    assert_eq!(saved, html.as_bytes());
}

#[tokio::test]
async fn test_layout_follows_url_paths() {
    let dir = TempDir::new().unwrap();
    let mut coordinator = Coordinator::new(test_config(dir.path()), FakeSession::new());

    let report = coordinator
        .run(&urls(&[
            "https://example.com/",
            "https://example.com/docs/guide/",
            "https://example.com//blog///post?page=2#top",
        ]))
        .await
        .unwrap();

    let saved: Vec<PathBuf> = report
        .outcomes
        .iter()
        .map(|o| o.saved_path.clone().unwrap())
        .collect();
    assert_eq!(
        saved,
        vec![
            dir.path().join("out/index.html"),
            dir.path().join("out/docs/guide/index.html"),
            dir.path().join("out/blog/post/index.html"),
        ]
    );
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let list = urls(&[
        "https://example.com/",
        "https://example.com/docs",
        "https://example.com/docs/api",
    ]);
    let mut config = test_config(dir.path());
    config.output.screenshots = true;

    let mut first = Coordinator::new(config.clone(), FakeSession::new());
    first.run(&list).await.unwrap();
    let after_first = snapshot_tree(dir.path());

    let mut second = Coordinator::new(config, FakeSession::new());
    second.run(&list).await.unwrap();
    let after_second = snapshot_tree(dir.path());

    assert_eq!(after_first.len(), 6);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_lost_browser_aborts_remaining_urls() {
    let dir = TempDir::new().unwrap();
    let first = "https://example.com/one";
    let crashing = "https://example.com/two";
    let never = "https://example.com/three";
    let session = FakeSession::new().script(crashing, vec![Step::Crash]);
    let mut coordinator = Coordinator::new(test_config(dir.path()), session);

    let aborted = coordinator
        .run(&urls(&[first, crashing, never]))
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, MirrorError::SessionFatal(_)));
    assert_eq!(coordinator.session().navigations_to(crashing), 1);
    assert_eq!(coordinator.session().navigations_to(never), 0);
    assert!(dir.path().join("out/one/index.html").exists());
    assert!(!dir.path().join("out/three/index.html").exists());
    assert!(!coordinator.session().closed);
}

#[tokio::test]
async fn test_browser_closed_after_fatal_abort() {
    let dir = TempDir::new().unwrap();
    let crashing = "https://example.com/two";
    let session = FakeSession::new().script(crashing, vec![Step::Crash]);
    let mut coordinator = Coordinator::new(test_config(dir.path()), session);

    let aborted = coordinator
        .run_and_close(&urls(&["https://example.com/one", crashing]))
        .await
        .unwrap_err();

    assert!(matches!(aborted.error, MirrorError::SessionFatal(_)));
    assert!(coordinator.session().closed);
}

#[tokio::test]
async fn test_browser_closed_after_complete_run() {
    let dir = TempDir::new().unwrap();
    let mut coordinator = Coordinator::new(test_config(dir.path()), FakeSession::new());

    let report = coordinator
        .run_and_close(&urls(&["https://example.com/"]))
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert!(coordinator.session().closed);
}

#[tokio::test]
async fn test_aborted_run_reports_every_input_url() {
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");
    let crashing = "https://example.com/two";
    let session = FakeSession::new().script(crashing, vec![Step::Crash]);
    let mut coordinator = Coordinator::new(test_config(dir.path()), session);

    let aborted = coordinator
        .run(&urls(&[
            "https://example.com/one",
            crashing,
            "https://example.com/three",
            "https://example.com/four",
        ]))
        .await
        .unwrap_err();
    aborted.report.write_json(&report_path).unwrap();

    let states: Vec<UrlState> = aborted.report.outcomes.iter().map(|o| o.state).collect();
    assert_eq!(
        states,
        vec![
            UrlState::Done,
            UrlState::FetchFailed,
            UrlState::Pending,
            UrlState::Pending
        ]
    );
    assert_eq!(aborted.report.succeeded(), 1);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["aborted"]["kind"], "session_fatal");
    let outcomes = json["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[1]["failure"]["kind"], "session_fatal");
    assert_eq!(outcomes[3]["url"], "https://example.com/four");
    assert_eq!(outcomes[3]["state"], "pending");
}

#[tokio::test]
async fn test_unreadable_page_counts_only_attempts_made() {
    let dir = TempDir::new().unwrap();
    let url = "https://example.com/blank";
    let session = FakeSession::new().script(url, vec![Step::Unreadable]);
    let mut coordinator = Coordinator::new(test_config(dir.path()), session);

    let report = coordinator.run(&urls(&[url])).await.unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state, UrlState::FetchFailed);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(coordinator.session().navigations_to(url), 1);
    assert!(!dir.path().join("out/blank/index.html").exists());
}

#[tokio::test]
async fn test_path_conflict_is_isolated() {
    let dir = TempDir::new().unwrap();
    let mut coordinator = Coordinator::new(test_config(dir.path()), FakeSession::new());

    let report = coordinator
        .run(&urls(&[
            "https://example.com/",
            "https://example.com/index.html",
            "https://example.com/after",
        ]))
        .await
        .unwrap();

    let states: Vec<UrlState> = report.outcomes.iter().map(|o| o.state).collect();
    assert_eq!(
        states,
        vec![UrlState::Done, UrlState::PersistFailed, UrlState::Done]
    );
    assert_eq!(
        report.outcomes[1].failure.as_ref().unwrap().kind,
        FailureKind::Filesystem
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out/index.html")).unwrap(),
        default_page("https://example.com/")
    );
}

#[tokio::test]
async fn test_screenshots_mirror_the_html_tree() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.output.screenshots = true;
    let mut coordinator = Coordinator::new(config, FakeSession::new());

    let report = coordinator
        .run(&urls(&["https://example.com/", "https://example.com/docs/guide"]))
        .await
        .unwrap();

    assert_eq!(coordinator.session().screenshots, 2);
    assert_eq!(
        report.outcomes[0].screenshot_path,
        Some(dir.path().join("screenshots/index.png"))
    );
    assert_eq!(
        report.outcomes[1].screenshot_path,
        Some(dir.path().join("screenshots/docs/guide.png"))
    );
    assert!(dir.path().join("screenshots/docs").is_dir());
    assert!(dir.path().join("screenshots/docs/guide.png").is_file());
}

#[tokio::test]
async fn test_report_keeps_input_order_and_tags_failures() {
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");
    let mut coordinator = Coordinator::new(test_config(dir.path()), FakeSession::new());

    let report = coordinator
        .run(&urls(&[
            "https://example.com/a",
            "mailto:someone@example.com",
            "https://example.com/b",
        ]))
        .await
        .unwrap();
    report.write_json(&report_path).unwrap();

    assert_eq!(coordinator.session().navigations.len(), 2);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    let outcomes = json["outcomes"].as_array().unwrap();
    assert_eq!(outcomes[0]["url"], "https://example.com/a");
    assert_eq!(outcomes[1]["url"], "mailto:someone@example.com");
    assert_eq!(outcomes[1]["state"], "fetch_failed");
    assert_eq!(outcomes[1]["failure"]["kind"], "malformed_url");
    assert_eq!(outcomes[1]["attempts"], 0);
    assert_eq!(outcomes[2]["state"], "done");
    assert!(outcomes[2]["load_time_secs"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_run_from_config_file_contents() {
    let dir = TempDir::new().unwrap();
    let toml = format!(
        r#"
urls = ["https://example.com/from-config"]

[output]
directory = "{}"

[navigation]
retries = 1
retry-interval-ms = 0
"#,
        dir.path().join("site").display().to_string().replace('\\', "/")
    );
    let config = parse_config(&toml).unwrap();
    let list = config.urls.clone();
    let session = FakeSession::new().always_failing("https://example.com/from-config", 1);
    let mut coordinator = Coordinator::new(config, session);

    let report = coordinator.run(&list).await.unwrap();

    assert_eq!(report.outcomes[0].state, UrlState::FetchFailed);
    assert_eq!(report.outcomes[0].attempts, 1);
    assert_eq!(
        coordinator.session().navigations_to("https://example.com/from-config"),
        1
    );
}
