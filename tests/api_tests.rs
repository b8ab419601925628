//! Web form routes driven through the router with `tower::ServiceExt`

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use common::offline_service;
use common::test_config;
use icebreaker::api::build_router;
use icebreaker::api::AppState;
use icebreaker::profile::MockProfileSource;
use icebreaker::profile::ProxycurlClient;
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    let config = test_config();
    let live = Arc::new(ProxycurlClient::from_config(&config).unwrap());
    let service = offline_service(&config, MockProfileSource::bundled(), live);
    let state = AppState::new(service, config.server.session_timeout_secs, "gemini");
    build_router(state, &config)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn session_id(page: &str) -> String {
    let marker = "name=\"session_id\" value=\"";
    let start = page.find(marker).expect("session id field") + marker.len();
    page[start..].split('"').next().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "healthy");
    assert_eq!(json["data"]["provider"], "gemini");
    assert_eq!(json["data"]["active_sessions"], 0);
}

#[tokio::test]
async fn test_index_renders_form() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("name=\"profile_url\""));
    assert!(page.contains("gemini-2.5-flash"));
}

#[tokio::test]
async fn test_process_then_chat() {
    let app = app();

    let response = app
        .clone()
        .oneshot(form_post("/process", "use_mock=on&model=gemini-2.5-flash"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Profile processed successfully!"));
    assert!(page.contains("Senior AI Engineer"));

    let id = session_id(&page);
    let response = app
        .clone()
        .oneshot(form_post(
            "/chat",
            &format!("session_id={id}&question=current+job+title%3F"),
        ))
        .await
        .unwrap();
    let page = body_text(response).await;
    assert!(page.contains("<strong>You:</strong> current job title?"));
    assert!(page.contains("<strong>Bot:</strong> Senior AI Engineer"));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["data"]["active_sessions"], 1);
}

#[tokio::test]
async fn test_process_error_is_rendered() {
    let response = app()
        .oneshot(form_post("/process", "use_mock=on&model=not-a-model"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("Error:"));
    assert!(!page.contains("name=\"session_id\""));
}

#[tokio::test]
async fn test_chat_with_unknown_session() {
    let response = app()
        .oneshot(form_post("/chat", "session_id=missing&question=hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Session expired"));
}

#[tokio::test]
async fn test_chat_without_session() {
    let response = app()
        .oneshot(form_post("/chat", "session_id=&question=hello"))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("No profile loaded"));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let response = app()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "no route for /nope");
}

#[tokio::test]
async fn test_live_url_without_key_shows_mock_notice() {
    let response = app()
        .oneshot(form_post(
            "/process",
            "profile_url=https%3A%2F%2Fwww.linkedin.com%2Fin%2Fsomeone%2F&api_key=",
        ))
        .await
        .unwrap();

    let page = body_text(response).await;
    assert!(page.contains("bundled mock profile was used"));
    assert!(page.contains("Profile processed successfully!"));
}
