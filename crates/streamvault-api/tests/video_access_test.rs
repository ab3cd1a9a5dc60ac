//! Signed download URLs, visibility, and soft delete.

mod helpers;

use helpers::{build_app, DEV_USER_ID};
use serde_json::Value;

#[tokio::test]
async fn owner_gets_a_download_url_for_a_private_video() {
    let app = build_app().await;
    let video = app.seed_video(DEV_USER_ID, false).await;

    let response = app
        .server
        .get(&format!("/api/v1/videos/{}/download-url", video.id))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["download_url"]
        .as_str()
        .unwrap()
        .contains(&video.storage_key));
}

#[tokio::test]
async fn private_video_of_another_user_is_forbidden() {
    let app = build_app().await;
    let video = app.seed_video("someone-else", false).await;

    let response = app
        .server
        .get(&format!("/api/v1/videos/{}/download-url", video.id))
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn public_video_of_another_user_is_accessible() {
    let app = build_app().await;
    let video = app.seed_video("someone-else", true).await;

    let response = app
        .server
        .get(&format!("/api/v1/videos/{}/download-url", video.id))
        .await;

    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn owner_can_toggle_visibility() {
    let app = build_app().await;
    let video = app.seed_video(DEV_USER_ID, false).await;

    let response = app
        .server
        .patch(&format!("/api/v1/videos/{}/visibility", video.id))
        .json(&serde_json::json!({ "is_public": true }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["is_public"], true);
}

#[tokio::test]
async fn non_owner_cannot_toggle_visibility() {
    let app = build_app().await;
    let video = app.seed_video("someone-else", false).await;

    let response = app
        .server
        .patch(&format!("/api/v1/videos/{}/visibility", video.id))
        .json(&serde_json::json!({ "is_public": true }))
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn soft_deleted_video_disappears() {
    let app = build_app().await;
    let video = app.seed_video(DEV_USER_ID, false).await;

    let response = app
        .server
        .delete(&format!("/api/v1/videos/{}", video.id))
        .await;
    assert_eq!(response.status_code(), 204);

    let response = app
        .server
        .get(&format!("/api/v1/videos/{}/download-url", video.id))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = build_app().await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_app().await;

    let response = app.server.get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/api/v1/videos/upload"].is_object());
}
