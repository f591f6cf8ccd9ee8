//! [`HttpAgentApi`] against a local axum server that answers canned JSON.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use tokio::net::TcpListener;

use bankr::api::AgentApi;
use bankr::api::http::HttpAgentApi;
use bankr::config::ClientConfig;
use bankr::error::BankrError;
use bankr::job::JobStatus;

const KEY: &str = "bk_test_0123456789";

/// One request as the server saw it.
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    query: Option<String>,
    api_key: Option<String>,
    body: String,
}

type Route = fn(&str, &str) -> (u16, String);

#[derive(Clone)]
struct Canned {
    route: Route,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn answer(
    State(canned): State<Canned>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let (status, reply) = (canned.route)(method.as_str(), uri.path());
    canned.seen.lock().unwrap().push(Seen {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        reply,
    )
}

/// Serve `route` on an ephemeral port. Returns the base URL and the log of
/// requests received.
async fn serve(route: Route) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(answer).with_state(Canned {
        route,
        seen: seen.clone(),
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}"), seen)
}

fn api(base: &str) -> HttpAgentApi {
    HttpAgentApi::new(ClientConfig::new(base, Some(KEY.to_string()))).unwrap()
}

fn happy_route(method: &str, path: &str) -> (u16, String) {
    match (method, path) {
        ("POST", "/agent/prompt") => (
            202,
            r#"{"success":true,"jobId":"job_abc","status":"pending","message":"Job created"}"#
                .to_string(),
        ),
        ("GET", "/agent/job/job_abc") => (
            200,
            r#"{
                "success": true,
                "jobId": "job_abc",
                "status": "completed",
                "prompt": "what is my balance?",
                "response": "You have 1.2 ETH",
                "statusUpdates": [
                    {"message": "Checking balance", "timestamp": "2025-01-01T00:00:01Z"}
                ],
                "transactions": [{"type": "swap", "metadata": {"humanReadableMessage": "Swap 1 ETH"}}],
                "createdAt": "2025-01-01T00:00:00Z",
                "processingTime": 1800
            }"#
            .to_string(),
        ),
        ("POST", "/agent/job/job_abc/cancel") => (
            200,
            r#"{"success":true,"jobId":"job_abc","status":"cancelled","cancelledAt":"2025-01-01T00:00:02Z"}"#
                .to_string(),
        ),
        _ => (404, r#"{"success":false,"error":"Job not found"}"#.to_string()),
    }
}

#[tokio::test]
async fn submit_posts_prompt_with_key() {
    let (base, seen) = serve(happy_route).await;

    let job = api(&base).submit("what is my balance?").await.unwrap();

    assert_eq!(job.id, "job_abc");
    assert_eq!(job.status, JobStatus::Pending);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/agent/prompt");
    assert_eq!(seen[0].api_key.as_deref(), Some(KEY));
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["prompt"], "what is my balance?");
}

#[tokio::test]
async fn fetch_status_decodes_full_snapshot() {
    let (base, _seen) = serve(happy_route).await;

    // Trailing slash on the base URL is tolerated
    let job = api(&format!("{base}/")).fetch_status("job_abc").await.unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.as_deref(), Some("You have 1.2 ETH"));
    assert_eq!(job.status_updates.len(), 1);
    assert_eq!(job.status_updates[0].message, "Checking balance");
    assert_eq!(job.transactions[0].summary(), "Swap 1 ETH");
    assert_eq!(job.processing_time, Some(1800.0));
}

#[tokio::test]
async fn cancel_posts_to_job_endpoint() {
    let (base, seen) = serve(happy_route).await;

    let job = api(&base).cancel("job_abc").await.unwrap();

    assert_eq!(job.status, JobStatus::Cancelled);
    assert_eq!(job.cancelled_at.as_deref(), Some("2025-01-01T00:00:02Z"));
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/agent/job/job_abc/cancel");
}

#[tokio::test]
async fn missing_job_is_not_found() {
    let (base, _seen) = serve(happy_route).await;

    let err = api(&base).fetch_status("job_gone").await.unwrap_err();

    assert!(matches!(err, BankrError::NotFound { ref job_id } if job_id == "job_gone"));
}

#[tokio::test]
async fn unsuccessful_body_is_remote_error() {
    fn route(_: &str, _: &str) -> (u16, String) {
        (200, r#"{"success":false,"message":"Rate limited"}"#.to_string())
    }
    let (base, _seen) = serve(route).await;

    let err = api(&base).submit("hi").await.unwrap_err();

    match err {
        BankrError::Remote {
            status_code,
            message,
        } => {
            assert_eq!(status_code, 200);
            assert_eq!(message, "Rate limited");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_json_body() {
    fn route(_: &str, _: &str) -> (u16, String) {
        (502, "bad gateway".to_string())
    }
    let (base, _seen) = serve(route).await;

    let err = api(&base).fetch_status("job_abc").await.unwrap_err();

    assert_eq!(err.status_code(), Some(502));
    assert!(err.to_string().contains("Unknown error"));
}

#[tokio::test]
async fn accepted_without_job_id_is_an_error() {
    fn route(_: &str, _: &str) -> (u16, String) {
        (200, r#"{"success":true,"status":"pending"}"#.to_string())
    }
    let (base, _seen) = serve(route).await;

    let err = api(&base).submit("hi").await.unwrap_err();

    assert!(err.to_string().contains("no job ID"));
}

#[tokio::test]
async fn missing_key_never_reaches_the_server() {
    let (base, seen) = serve(happy_route).await;
    let api = HttpAgentApi::new(ClientConfig::new(base, None)).unwrap();

    let err = api.submit("hi").await.unwrap_err();

    assert!(matches!(err, BankrError::Auth(_)));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn job_id_is_percent_encoded_into_one_segment() {
    let (base, seen) = serve(happy_route).await;
    let api = api(&base);

    // Unknown to the server, but it must arrive as a single path segment
    let fetched = api.fetch_status("a?b=1").await.unwrap_err();
    let cancelled = api.cancel("a#frag").await.unwrap_err();

    assert!(matches!(fetched, BankrError::NotFound { .. }));
    assert!(matches!(cancelled, BankrError::NotFound { .. }));
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].path, "/agent/job/a%3Fb=1");
    assert!(seen[0].query.is_none());
    assert_eq!(seen[1].path, "/agent/job/a%23frag/cancel");
}

#[tokio::test]
async fn dot_segment_job_ids_never_reach_the_server() {
    let (base, seen) = serve(happy_route).await;
    let api = api(&base);

    for id in [".", ".."] {
        assert!(matches!(
            api.fetch_status(id).await,
            Err(BankrError::Validation(_))
        ));
        assert!(matches!(api.cancel(id).await, Err(BankrError::Validation(_))));
    }
    assert!(seen.lock().unwrap().is_empty());
}
