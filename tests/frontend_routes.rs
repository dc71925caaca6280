//! Front end routes exercised in-process with tower's oneshot

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    routing::post,
};
use data_prep_agent::frontend::{FrontendState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "XBOUNDARYX";

fn state(upload_dir: &Path, agent_url: &str) -> FrontendState {
    FrontendState {
        upload_dir: Arc::new(upload_dir.to_path_buf()),
        agent_url: Arc::new(agent_url.to_string()),
        client: reqwest::Client::new(),
    }
}

fn multipart_body(parts: &[(&str, &str, &str)]) -> String {
    let mut body = String::new();
    for (field, filename, contents) in parts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn upload_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn chat_request(message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "message": message }).to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Fake agent service on an ephemeral port; echoes the request under `value`
async fn spawn_agent(status: StatusCode) -> String {
    let app = Router::new().route(
        "/generate",
        post(move |Json(payload): Json<Value>| async move {
            let reply = json!({
                "value": format!(
                    "agent saw: {} (kb={})",
                    payload["input_message"].as_str().unwrap_or_default(),
                    payload["use_knowledge_base"]
                )
            });
            (status, Json(reply))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/generate")
}

#[tokio::test]
async fn index_serves_html_page() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(dir.path(), "http://127.0.0.1:9/unused"));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("upload-form"));
    assert!(html.contains("chat-box"));
}

#[tokio::test]
async fn upload_saves_only_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("data_files");
    let app = build_router(state(&uploads, "http://127.0.0.1:9/unused"));

    let body = multipart_body(&[
        ("files", "train.csv", "a,b\n1,2"),
        ("files", "notes.txt", "hello"),
        ("files", "../../Escape.CSV", "x,y"),
    ]);
    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"message": "2 file(s) uploaded successfully."})
    );

    assert_eq!(std::fs::read_to_string(uploads.join("train.csv")).unwrap(), "a,b\n1,2");
    assert!(uploads.join("Escape.CSV").exists());
    assert!(!uploads.join("notes.txt").exists());
}

#[tokio::test]
async fn upload_without_files_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(dir.path(), "http://127.0.0.1:9/unused"));

    let body = multipart_body(&[("other", "train.csv", "a,b")]);
    let response = app.clone().oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"message": "No files part"}));

    let not_multipart = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(not_multipart).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_refuses_before_any_upload() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(state(&dir.path().join("missing"), "http://127.0.0.1:9/unused"));
    let response = app.oneshot(chat_request("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"reply": "please upload a file first"})
    );
}

#[tokio::test]
async fn chat_relays_to_agent_service() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("train.csv"), "a,b\n").unwrap();
    let agent_url = spawn_agent(StatusCode::OK).await;

    let app = build_router(state(dir.path(), &agent_url));
    let response = app.oneshot(chat_request("predict b")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"reply": "agent saw: predict b (kb=true)"})
    );
}

#[tokio::test]
async fn chat_maps_agent_failure_to_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("train.csv"), "a,b\n").unwrap();
    let agent_url = spawn_agent(StatusCode::INTERNAL_SERVER_ERROR).await;

    let app = build_router(state(dir.path(), &agent_url));
    let response = app.oneshot(chat_request("predict b")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(
        body["reply"]
            .as_str()
            .unwrap()
            .starts_with("agent service error:")
    );
}
