//! Profile lookup and page requests over real HTTP, against a local mock server.

#[path = "common/mod.rs"]
mod common;

use common::*;
use plurkdl::{
    build_client, AccountId, DownloadOptions, ExportFormat, HttpPageFetcher, IdentifierResolver, PageFetcher,
    PageResult, ProfilePageResolver, StopReason, TimelineDownloader, TimelineError, NO_READ_PERMISSION,
};
use serde_json::{json, Value};
use std::time::Duration;
use time::UtcOffset;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_PATH: &str = "/TimeLine/getPlurks";

/// A mock server plus the runtime that drives its async API. The code under test
/// stays blocking and is called outside the runtime.
struct Server {
    server: MockServer,
    rt: Runtime,
}

impl Server {
    fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn uri(&self) -> String {
        self.server.uri()
    }

    /// Check every `.expect(n)` set on the mounted mocks.
    fn verify(&self) {
        self.rt.block_on(self.server.verify());
    }
}

fn client() -> reqwest::blocking::Client {
    build_client(&DownloadOptions::default().with_request_timeout(Duration::from_secs(5))).unwrap()
}

fn post_json(plurk_id: u64, posted: &str) -> Value {
    json!({
        "plurk_id": plurk_id,
        "owner_id": 4242,
        "posted": posted,
        "content": format!("<p>post {plurk_id}</p>"),
        "content_raw": format!("post {plurk_id}"),
        "response_count": 1,
    })
}

fn page_mock() -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(path(PAGE_PATH))
}

/// Address nothing listens on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// One call is one form POST carrying `user_id`, `offset` and `only_user=1`;
/// the posts come back in service order.
#[test]
fn page_request_posts_form_fields_once() {
    let s = Server::start();
    s.mount(
        page_mock()
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("user_id=4242"))
            .and(body_string_contains("offset=2020-01-11T01%3A14%3A29.000Z"))
            .and(body_string_contains("only_user=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "plurks": [post_json(12345, &jan2020(11, 1, 14, 29)), post_json(12000, &jan2020(10, 0, 0, 1))]
            })))
            .expect(1),
    );

    let mut fetcher = HttpPageFetcher::new(client(), &s.uri()).with_retries(2, 1);
    match fetcher.fetch(&AccountId::new("4242"), "2020-01-11T01:14:29.000Z").unwrap() {
        PageResult::Page(records) => {
            assert_eq!(records.iter().map(|r| r.plurk_id).collect::<Vec<_>>(), vec![12345, 12000]);
            assert_eq!(records[0].content_raw, "post 12345");
        }
        other => panic!("expected a page, got {other:?}"),
    }
    s.verify();
}

/// A permission error arrives with a 4xx status; it is still `Denied`, asked once.
#[test]
fn permission_error_with_client_status_is_denied_once() {
    let s = Server::start();
    s.mount(
        page_mock()
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": NO_READ_PERMISSION })))
            .expect(1),
    );

    let mut fetcher = HttpPageFetcher::new(client(), &s.uri()).with_retries(3, 1);
    assert_eq!(fetcher.fetch(&AccountId::new("7"), "2020-01-11T01:14:29.000Z").unwrap(), PageResult::Denied);
    s.verify();
}

/// An empty post list and an unknown service error both end the download.
#[test]
fn empty_page_and_unknown_error_end() {
    let s = Server::start();
    s.mount(
        page_mock()
            .and(body_string_contains("user_id=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "plurks": [] }))),
    );
    s.mount(
        page_mock()
            .and(body_string_contains("user_id=2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "SomethingElseError" }))),
    );

    let mut fetcher = HttpPageFetcher::new(client(), &s.uri());
    assert_eq!(fetcher.fetch(&AccountId::new("1"), "2020-01-11T01:14:29.000Z").unwrap(), PageResult::End);
    assert_eq!(fetcher.fetch(&AccountId::new("2"), "2020-01-11T01:14:29.000Z").unwrap(), PageResult::End);
}

/// A failing status with a non-JSON body is a `Status` error and is not retried.
#[test]
fn non_json_failure_is_status_error() {
    let s = Server::start();
    s.mount(
        page_mock()
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .expect(1),
    );

    let mut fetcher = HttpPageFetcher::new(client(), &s.uri()).with_retries(2, 1);
    match fetcher.fetch(&AccountId::new("1"), "2020-01-11T01:14:29.000Z") {
        Err(TimelineError::Status { url, status }) => {
            assert_eq!(status, 502);
            assert!(url.ends_with(PAGE_PATH), "{url}");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    s.verify();
}

/// A success status with a body that is not JSON ends the download.
#[test]
fn non_json_success_ends() {
    let s = Server::start();
    s.mount(page_mock().respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>")));

    let mut fetcher = HttpPageFetcher::new(client(), &s.uri());
    assert_eq!(fetcher.fetch(&AccountId::new("1"), "2020-01-11T01:14:29.000Z").unwrap(), PageResult::End);
}

/// Timeouts are retried `retries` extra times, then surface as a transport error.
#[test]
fn timeouts_are_retried_then_reported() {
    let s = Server::start();
    s.mount(
        page_mock()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "plurks": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(3),
    );

    let quick = reqwest::blocking::Client::builder().timeout(Duration::from_millis(200)).build().unwrap();
    let mut fetcher = HttpPageFetcher::new(quick, &s.uri()).with_retries(2, 1);
    match fetcher.fetch(&AccountId::new("1"), "2020-01-11T01:14:29.000Z") {
        Err(TimelineError::Transport(e)) => assert!(e.is_timeout(), "{e}"),
        other => panic!("expected a timeout, got {other:?}"),
    }
    s.verify();
}

/// Nothing listening: the page request and the profile lookup both fail as transport
/// errors, never as resolution errors.
#[test]
fn refused_connection_is_transport_error() {
    let base = closed_port_url();

    let mut fetcher = HttpPageFetcher::new(client(), &base).with_retries(1, 1);
    match fetcher.fetch(&AccountId::new("1"), "2020-01-11T01:14:29.000Z") {
        Err(TimelineError::Transport(e)) => assert!(e.is_connect(), "{e}"),
        other => panic!("expected a connect error, got {other:?}"),
    }

    let resolver = ProfilePageResolver::new(client(), base);
    assert!(matches!(resolver.resolve("alice"), Err(TimelineError::Transport(_))));
}

/// The profile page embeds the numeric id; a leading `@` on the handle is ignored.
#[test]
fn profile_page_yields_account_id() {
    let s = Server::start();
    s.mount(
        Mock::given(method("GET"))
            .and(path("/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><script>var GLOBAL = {"page_user": {"nick_name": "alice", "user_id": 4242}};</script></html>"#,
            ))
            .expect(1),
    );

    let resolver = ProfilePageResolver::new(client(), s.uri());
    assert_eq!(resolver.resolve("@alice").unwrap().as_str(), "4242");
    s.verify();
}

/// A missing profile or a page without an id is a resolution error; any other
/// failing status is a status error.
#[test]
fn profile_failures_are_classified() {
    let s = Server::start();
    s.mount(Mock::given(method("GET")).and(path("/ghost")).respond_with(ResponseTemplate::new(404)));
    s.mount(
        Mock::given(method("GET"))
            .and(path("/blank"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no data here</html>")),
    );
    s.mount(Mock::given(method("GET")).and(path("/broken")).respond_with(ResponseTemplate::new(500)));

    let resolver = ProfilePageResolver::new(client(), s.uri());
    match resolver.resolve("ghost") {
        Err(TimelineError::Resolution { handle }) => assert_eq!(handle, "ghost"),
        other => panic!("expected a resolution error, got {other:?}"),
    }
    match resolver.resolve("blank") {
        Err(TimelineError::Resolution { handle }) => assert_eq!(handle, "blank"),
        other => panic!("expected a resolution error, got {other:?}"),
    }
    match resolver.resolve("broken") {
        Err(TimelineError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected a status error, got {other:?}"),
    }
}

/// End to end over HTTP: lookup, one page, then an empty page requested at the
/// oldest post's time; files are written from what came back.
#[test]
fn live_run_downloads_and_exports() {
    let s = Server::start();
    s.mount(
        Mock::given(method("GET"))
            .and(path("/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"user_id": 4242}"#)),
    );
    s.mount(
        page_mock()
            .and(body_string_contains("user_id=4242"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "plurks": [post_json(12345, &jan2020(11, 1, 14, 29)), post_json(12000, &jan2020(10, 0, 0, 1))]
            })))
            .up_to_n_times(1)
            .expect(1),
    );
    s.mount(
        page_mock()
            .and(body_string_contains("offset=2020-01-10T00%3A00%3A01.000Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "plurks": [] })))
            .expect(1),
    );

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("alice");
    let summary = TimelineDownloader::new()
        .handle("alice")
        .output_base(&base)
        .format(ExportFormat::Txt)
        .format(ExportFormat::Json)
        .base_url(s.uri())
        .request_timeout(Duration::from_secs(5))
        .progress(false)
        .zone(UtcOffset::UTC)
        .run()
        .unwrap();

    assert_eq!(summary.account.as_str(), "4242");
    assert_eq!(summary.posts, 2);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.stop, StopReason::End);
    assert_eq!(summary.files.len(), 2);

    let lines = read_lines(&base.with_extension("txt"));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("00001==12345==2020-01-11 01:14:29==post 12345=="), "{}", lines[0]);
    s.verify();
}
