//! End-to-end CLI contract: spawns the real binary, strictly offline.
//! Network-facing paths run against local fixture servers.

use assert_cmd::Command;
use predicates::prelude::*;
use std::net::SocketAddr;

fn quest_cmd(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("quest").unwrap();
    cmd.env("QUEST_DATA_DIR", data_dir);
    cmd.env_remove("QUEST_OPENAI_API_KEY");
    cmd.env_remove("QUEST_SEARCH_ENDPOINT");
    cmd
}

#[test]
fn version_prints_the_package_version() {
    let tmp = tempfile::tempdir().unwrap();
    quest_cmd(tmp.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn doctor_reports_configuration_without_secrets() {
    let tmp = tempfile::tempdir().unwrap();
    let assert = quest_cmd(tmp.path())
        .arg("doctor")
        .env("QUEST_OPENAI_API_KEY", "sk-super-secret")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"has_api_key\": true"))
        .stdout(predicate::str::contains("sk-super-secret").not());

    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).expect("doctor emits json");
    assert_eq!(parsed["store_exists"], false);
    assert!(parsed["data_dir"]
        .as_str()
        .unwrap()
        .contains(tmp.path().to_str().unwrap()));
}

#[test]
fn doctor_without_a_key_says_so() {
    let tmp = tempfile::tempdir().unwrap();
    quest_cmd(tmp.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"has_api_key\": false"));
}

#[test]
fn chat_rejects_unknown_personas() {
    let tmp = tempfile::tempdir().unwrap();
    quest_cmd(tmp.path())
        .args(["chat", "--persona", "grumpy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown persona"));
}

/// Offline crawl contract: fixture search page linking to fixture pages, two
/// of which are dead. Re-running the same query must hit the duplicate-query
/// notice without touching the network.
#[test]
fn search_crawls_fixture_pages_and_caches_the_query() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let addr: SocketAddr = rt.block_on(async {
        use axum::{extract::State, http::StatusCode, response::Html, routing::get, Router};

        async fn search_page(State(addr): State<String>) -> Html<String> {
            let links = [
                format!("/url?q=http://{addr}/dead&sa=U&ved=1"),
                format!("/url?q=http://{addr}/page/1&sa=U&ved=2"),
                format!("/url?q=http://{addr}/page/2&sa=U&ved=3"),
            ];
            let anchors: String = links
                .iter()
                .map(|l| format!("<a href=\"{l}\">result</a>"))
                .collect();
            Html(format!("<html><body>{anchors}</body></html>"))
        }

        async fn page(
            axum::extract::Path(n): axum::extract::Path<u32>,
        ) -> Html<String> {
            Html(format!(
                "<html><body><p>Fixture page {n} holds a sentence that is clearly longer than thirty characters.</p></body></html>"
            ))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/search", get(search_page))
            .route("/page/:n", get(page))
            .route("/dead", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .with_state(addr.to_string());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    });

    let tmp = tempfile::tempdir().unwrap();
    let endpoint = format!("http://{addr}/search");

    quest_cmd(tmp.path())
        .env("QUEST_SEARCH_ENDPOINT", &endpoint)
        .args(["search", "rust fixtures", "--pages", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 pages contributed"))
        .stdout(predicate::str::contains("Fixture page 1"))
        .stdout(predicate::str::contains("Fixture page 2"));

    assert!(tmp.path().join("snippets.json").exists());

    quest_cmd(tmp.path())
        .env("QUEST_SEARCH_ENDPOINT", &endpoint)
        .args(["search", "rust fixtures", "--pages", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "This query is cached in your history already.",
        ));

    drop(rt);
}

#[test]
fn search_surfaces_rate_limiting_as_a_warning() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let addr: SocketAddr = rt.block_on(async {
        use axum::{http::StatusCode, routing::get, Router};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/search", get(|| async { StatusCode::TOO_MANY_REQUESTS }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    });

    let tmp = tempfile::tempdir().unwrap();
    quest_cmd(tmp.path())
        .env("QUEST_SEARCH_ENDPOINT", format!("http://{addr}/search"))
        .args(["search", "throttled"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("rate limiting"));

    drop(rt);
}
