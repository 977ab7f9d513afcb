use super::*;
use crate::config::FetchConfig;
use crate::fetcher::Fetcher;
use crate::fetcher::test_helpers::MockQuoteProvider;
use crate::store::UserStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt; // for oneshot()


/// Service over a scripted provider and an empty store
fn test_service(provider: MockQuoteProvider) -> UserService {
    let fetcher = Fetcher::new(Arc::new(provider), &FetchConfig::default());
    UserService::new(Arc::new(UserStore::new()), fetcher)
}

fn test_router(provider: MockQuoteProvider) -> Router {
    create_router(test_service(provider), Arc::new(Config::default()))
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_router(MockQuoteProvider::new());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let app = test_router(MockQuoteProvider::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    assert!(spec["paths"]["/user/create"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let mut config = Config::default();
    config.api.swagger_ui = false;
    let app = create_router(test_service(MockQuoteProvider::new()), Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = test_router(MockQuoteProvider::new());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_enabled() {
    let app = test_router(MockQuoteProvider::new());

    let request = Request::builder()
        .uri("/")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origins() {
    let mut config = Config::default();
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(test_service(MockQuoteProvider::new()), Arc::new(config));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("Origin", "http://allowed.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://allowed.example"
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("Origin", "http://other.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = Config::default();
    config.api.cors_enabled = false;
    let app = create_router(test_service(MockQuoteProvider::new()), Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_api_server_shuts_down_gracefully() {
    let mut config = Config::default();
    // Port 0 = OS assigns a free port
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(start_api_server(
        test_service(MockQuoteProvider::new()),
        Arc::new(config),
        async move {
            stop_rx.await.ok();
        },
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server stops after shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_api_server_reports_bind_failure() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = Config::default();
    config.api.bind_address = occupied.local_addr().unwrap();

    let result = start_api_server(
        test_service(MockQuoteProvider::new()),
        Arc::new(config),
        std::future::pending(),
    )
    .await;

    assert!(matches!(result, Err(crate::error::Error::Io(_))));
}
