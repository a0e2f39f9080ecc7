// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use pretty_assertions::assert_eq;
use quarantine_tracker::{
    config::ApiToken,
    errors::IssueSyncError,
    issue::{GitHubIssueTracker, IssueRef, IssueState, IssueTracker, IssueUpdate},
};
use serde_json::json;
use std::{io::Read, thread, thread::JoinHandle};
use tiny_http::{Header, Method, Response, Server};

/// What the server saw of a request.
#[derive(Debug)]
struct ReceivedRequest {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: String,
}

/// Serves a single request on a loopback port with the given status and JSON body.
fn serve_once(status: u16, response_body: &'static str) -> (String, JoinHandle<ReceivedRequest>) {
    let server = Server::http("127.0.0.1:0").expect("bound loopback server");
    let addr = server
        .server_addr()
        .to_ip()
        .expect("server listens on an IP address");

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("received a request");
        let authorization = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Authorization"))
            .map(|header| header.value.as_str().to_owned());
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        let received = ReceivedRequest {
            method: request.method().clone(),
            path: request.url().to_owned(),
            authorization,
            body,
        };

        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("valid header");
        request
            .respond(
                Response::from_string(response_body)
                    .with_status_code(status)
                    .with_header(content_type),
            )
            .expect("sent response");
        received
    });

    (format!("http://{addr}"), handle)
}

fn issue() -> IssueRef {
    IssueRef::new("apache/airflow".parse().expect("valid repository"), 10118)
}

#[test]
fn fetch_body() {
    let (api_url, handle) = serve_once(200, r#"{"number": 10118, "body": "| Test |"}"#);
    let tracker = GitHubIssueTracker::new(api_url, Some(ApiToken::new("ghp_secret")));

    let body = tracker.fetch_body(&issue()).expect("issue is fetched");
    assert_eq!(body, "| Test |");

    let received = handle.join().expect("server thread exited cleanly");
    assert_eq!(received.method, Method::Get);
    assert_eq!(received.path, "/repos/apache/airflow/issues/10118");
    assert_eq!(received.authorization.as_deref(), Some("Bearer ghp_secret"));
}

#[test]
fn fetch_null_body_unauthenticated() {
    let (api_url, handle) = serve_once(200, r#"{"number": 10118, "body": null}"#);
    let tracker = GitHubIssueTracker::new(api_url, None);

    let body = tracker.fetch_body(&issue()).expect("issue is fetched");
    assert_eq!(body, "");

    let received = handle.join().expect("server thread exited cleanly");
    assert_eq!(received.authorization, None);
}

#[test]
fn fetch_missing_issue() {
    let (api_url, handle) = serve_once(404, r#"{"message": "Not Found"}"#);
    let tracker = GitHubIssueTracker::new(api_url, Some(ApiToken::new("ghp_secret")));

    let err = tracker
        .fetch_body(&issue())
        .expect_err("issue doesn't exist");
    handle.join().expect("server thread exited cleanly");
    assert!(
        matches!(&err, IssueSyncError::NotFound { issue } if issue == "apache/airflow#10118"),
        "unexpected error: {err:?}"
    );
}

#[test]
fn fetch_malformed_response() {
    let (api_url, handle) = serve_once(200, "not json");
    let tracker = GitHubIssueTracker::new(api_url, None);

    let err = tracker.fetch_body(&issue()).expect_err("response is invalid");
    handle.join().expect("server thread exited cleanly");
    assert!(
        matches!(err, IssueSyncError::Decode { .. }),
        "unexpected error: {err:?}"
    );
}

#[test]
fn update_issue() {
    let (api_url, handle) = serve_once(200, r#"{"number": 10118}"#);
    let tracker = GitHubIssueTracker::new(api_url, Some(ApiToken::new("ghp_secret")));

    let update = IssueUpdate {
        title: Some("Quarantined tests".to_owned()),
        body: "header\n\n| Test |".to_owned(),
        state: IssueState::Closed,
    };
    tracker.update(&issue(), &update).expect("issue is updated");

    let received = handle.join().expect("server thread exited cleanly");
    assert_eq!(received.method, Method::Patch);
    assert_eq!(received.path, "/repos/apache/airflow/issues/10118");
    assert_eq!(received.authorization.as_deref(), Some("Bearer ghp_secret"));
    let body: serde_json::Value =
        serde_json::from_str(&received.body).expect("request body is JSON");
    assert_eq!(
        body,
        json!({
            "title": "Quarantined tests",
            "body": "header\n\n| Test |",
            "state": "closed",
        })
    );
}

#[test]
fn update_rejected() {
    let (api_url, handle) = serve_once(403, r#"{"message": "Resource not accessible"}"#);
    let tracker = GitHubIssueTracker::new(api_url, None);

    let update = IssueUpdate {
        title: None,
        body: String::new(),
        state: IssueState::Open,
    };
    let err = tracker
        .update(&issue(), &update)
        .expect_err("update is forbidden");
    handle.join().expect("server thread exited cleanly");
    assert!(
        matches!(&err, IssueSyncError::Request { method: "PATCH", .. }),
        "unexpected error: {err:?}"
    );
}
