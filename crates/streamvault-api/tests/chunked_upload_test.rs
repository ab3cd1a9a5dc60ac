//! Chunked upload pipeline tests.

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::build_app;
use serde_json::Value;

fn chunk_form(
    upload_id: &str,
    chunk_index: u32,
    total_chunks: u32,
    data: Vec<u8>,
    title: &str,
) -> MultipartForm {
    MultipartForm::new()
        .add_part(
            "chunk",
            Part::bytes(bytes::Bytes::from(data))
                .file_name(format!("chunk-{}", chunk_index))
                .mime_type("application/octet-stream".to_string()),
        )
        .add_text("upload_id", upload_id.to_string())
        .add_text("chunk_index", chunk_index.to_string())
        .add_text("total_chunks", total_chunks.to_string())
        .add_text("title", title.to_string())
}

#[tokio::test]
async fn out_of_order_chunks_assemble_in_index_order() {
    let app = build_app().await;

    // Index order must win over arrival order: 2, 0, 1 with contents C, A, B.
    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form("session-1", 2, 3, b"C".to_vec(), "Chunked clip"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["received_chunks"], 1);
    assert_eq!(body["total_chunks"], 3);

    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form("session-1", 0, 3, b"A".to_vec(), "Chunked clip"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["received_chunks"], 2);

    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form("session-1", 1, 3, b"B".to_vec(), "Chunked clip"))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["title"], "Chunked clip");
    assert_eq!(body["file_size"], 3);

    let id = body["id"].as_str().unwrap().parse().unwrap();
    use streamvault_core::VideoRepository;
    let video = app.videos.get_video(id).await.unwrap().unwrap();
    let stored = app.state.storage.download(&video.storage_key).await.unwrap();
    assert_eq!(stored, b"ABC");

    // Session state and staging are gone.
    assert_eq!(app.state.assembler.session_count().await, 0);
    assert_eq!(app.leftover_staging_dirs(), 0);
}

#[tokio::test]
async fn duplicate_chunk_overwrites_instead_of_completing() {
    let app = build_app().await;

    for _ in 0..2 {
        let response = app
            .server
            .post("/api/v1/videos/upload-chunk")
            .multipart(chunk_form("session-2", 0, 2, b"AA".to_vec(), "Dup"))
            .await;
        assert_eq!(response.status_code(), 200);
        let body: Value = response.json();
        assert_eq!(body["received_chunks"], 1);
    }
}

#[tokio::test]
async fn missing_session_fields_are_a_client_error() {
    let app = build_app().await;

    let form = MultipartForm::new().add_part(
        "chunk",
        Part::bytes(bytes::Bytes::from_static(b"data")).file_name("chunk-0".to_string()),
    );
    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("upload_id, chunk_index, and total_chunks are required"));
}

#[tokio::test]
async fn chunk_index_out_of_range_is_rejected() {
    let app = build_app().await;

    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form("session-3", 5, 3, b"data".to_vec(), "Bad index"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn empty_chunk_is_rejected() {
    let app = build_app().await;

    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form("session-4", 0, 2, vec![], "Empty chunk"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn assembled_file_goes_through_full_inspection() {
    let app = build_app().await;

    // Individually unremarkable chunks that concatenate into an executable
    // header: chunk 0 = "MZ", chunk 1 = padding.
    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form("session-5", 0, 2, b"MZ".to_vec(), "Sneaky"))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form(
            "session-5",
            1,
            2,
            vec![0x90; 64],
            "Sneaky",
        ))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "SECURITY_REJECTED");
    let errors = body["errors"].as_array().unwrap();
    assert!(errors
        .iter()
        .any(|e| e.as_str().unwrap().contains("Windows executable")));

    // No record, no session, no staging leftovers.
    assert_eq!(app.videos.count().await, 0);
    assert_eq!(app.state.assembler.session_count().await, 0);
    assert_eq!(app.leftover_staging_dirs(), 0);
}

#[tokio::test]
async fn completing_chunk_metadata_wins() {
    let app = build_app().await;

    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(chunk_form("session-6", 0, 2, b"A".to_vec(), "Early title"))
        .await;
    assert_eq!(response.status_code(), 200);

    let form = chunk_form("session-6", 1, 2, b"B".to_vec(), "Final title")
        .add_text("is_public", "true")
        .add_text("tags", "late,tags");
    let response = app
        .server
        .post("/api/v1/videos/upload-chunk")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["title"], "Final title");
    assert_eq!(body["is_public"], true);
    assert_eq!(body["tags"], serde_json::json!(["late", "tags"]));
}
