//! In-process router tests (no sockets).

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
};
use cors_relay::config::ProxyConfig;
use cors_relay::http::HttpServer;
use serde_json::Value;
use tower::ServiceExt;

async fn send(method: Method, uri: &str) -> Response {
    let router = HttpServer::new(ProxyConfig::default()).unwrap().router();
    router
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_cors(response: &Response) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-expose-headers"], "*");
}

#[tokio::test]
async fn test_preflight_answered_locally() {
    for uri in ["/proxy/https://unreachable.invalid/x", "/proxy", "/proxy/not-a-url"] {
        let response = send(Method::OPTIONS, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "uri {}", uri);
        assert_cors(&response);
        assert_eq!(response.headers()["access-control-max-age"], "86400");
        assert_eq!(
            response.headers()["access-control-allow-methods"],
            "GET, POST, PUT, DELETE, PATCH, OPTIONS, HEAD"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn test_invalid_target_envelope() {
    let response = send(Method::POST, "/proxy/mailto:someone@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    let body = json(response).await;
    assert_eq!(body["error"], "Invalid target URL");
    assert_eq!(body["kind"], "InvalidTargetURL");
    assert_eq!(body["targetUrl"], "mailto:someone@example.com");
}

#[tokio::test]
async fn test_request_id_assigned() {
    let response = send(Method::GET, "/proxy/nope").await;
    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_health() {
    let response = send(Method::GET, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    let body = json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_path_and_method_carry_cors() {
    let response = send(Method::GET, "/elsewhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);

    let response = send(Method::TRACE, "/proxy/https://example.com").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_cors(&response);
}
