//! Router assembly: health, docs toggling, and the body size limit.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::post,
    Router,
};
use tower::util::ServiceExt;
use utoipa::OpenApi;

use api_ingress::{ApiIngress, ApiIngressConfig};

#[derive(OpenApi)]
#[openapi(info(title = "test api"))]
struct TestDoc;

async fn echo(body: String) -> String {
    body
}

fn ingress(enable_docs: bool, body_limit_bytes: usize) -> ApiIngress {
    ApiIngress::new(ApiIngressConfig {
        enable_docs,
        body_limit_bytes,
        ..Default::default()
    })
}

async fn status_of(router: Router, method: Method, uri: &str, body: Body) -> StatusCode {
    router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn health_reports_healthy() {
    let router = ingress(false, 1024)
        .build_router(Router::new(), None)
        .unwrap();
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn docs_are_served_only_when_enabled() {
    let on = ingress(true, 1024)
        .build_router(Router::new(), Some(TestDoc::openapi()))
        .unwrap();
    assert_eq!(
        status_of(on.clone(), Method::GET, "/openapi.json", Body::empty()).await,
        StatusCode::OK
    );
    assert_eq!(
        status_of(on, Method::GET, "/docs", Body::empty()).await,
        StatusCode::OK
    );

    let off = ingress(false, 1024)
        .build_router(Router::new(), Some(TestDoc::openapi()))
        .unwrap();
    assert_eq!(
        status_of(off, Method::GET, "/openapi.json", Body::empty()).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = Router::new().route("/echo", post(echo));
    let router = ingress(false, 16).build_router(app, None).unwrap();

    assert_eq!(
        status_of(router.clone(), Method::POST, "/echo", Body::from("short")).await,
        StatusCode::OK
    );
    assert_eq!(
        status_of(router, Method::POST, "/echo", Body::from("x".repeat(64))).await,
        StatusCode::PAYLOAD_TOO_LARGE
    );
}

#[tokio::test]
async fn serve_reports_bound_address_and_stops_on_cancel() {
    let ingress = ingress(false, 1024);
    ingress.set_config(ApiIngressConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        ..Default::default()
    });
    ingress.build_router(Router::new(), None).unwrap();

    let cancel = tokio_util::sync::CancellationToken::new();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let server = {
        let cancel = cancel.clone();
        tokio::spawn(async move { ingress.serve(cancel, Some(tx)).await })
    };

    let addr = rx.await.unwrap();
    assert_ne!(addr.port(), 0);

    cancel.cancel();
    server.await.unwrap().unwrap();
}
