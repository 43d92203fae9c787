use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tower::util::ServiceExt; // for `oneshot`

use api_ingress::problem::{Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
use api_ingress::request_id::XRequestId;
use api_ingress::{ApiIngress, ApiIngressConfig};

fn test_app() -> Router {
    let routes = Router::new()
        .route("/test", get(echo_handler))
        .route("/error", get(error_handler));
    ApiIngress::new(ApiIngressConfig::default())
        .build_router(routes, None)
        .unwrap()
}

async fn echo_handler(Extension(XRequestId(request_id)): Extension<XRequestId>) -> String {
    request_id
}

async fn error_handler() -> ProblemResponse {
    Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error", "Test error")
        .with_code("INTERNAL")
        .into()
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let response = test_app()
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("x-request-id should be generated");
    assert!(!header.is_empty());

    // Handler sees the same id the client gets back
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(std::str::from_utf8(&body).unwrap(), header);
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert_eq!(request_id, Some("abc-123"));
}

#[tokio::test]
async fn problem_responses_keep_request_id_header() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/error")
                .header("x-request-id", "error-test-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("error-test-123")
    );
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some(APPLICATION_PROBLEM_JSON)
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["detail"], "Test error");
    assert_eq!(json["status"], 500);
    assert_eq!(json["code"], "INTERNAL");
}
