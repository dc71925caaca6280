//! Web front end: CSV upload and a chat box relayed to the agent service

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DataPrepError, Result};

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>CSV Uploader &amp; Chat</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; }
        #chat-box { border: 1px solid #ccc; height: 300px; overflow-y: scroll; padding: 10px; margin-bottom: 10px; }
        #chat-input { width: 80%; }
        #send-btn { width: 18%; }
    </style>
</head>
<body>
    <h2>Upload CSV Files</h2>
    <form id="upload-form" enctype="multipart/form-data">
        <input type="file" name="files" multiple accept=".csv">
        <button type="submit">Upload</button>
    </form>
    <div id="upload-status"></div>
    <hr>
    <h2>Chat Window</h2>
    <div id="chat-box"></div>
    <input type="text" id="chat-input" placeholder="Type your message...">
    <button id="send-btn">Send</button>
    <script>
        document.getElementById('upload-form').onsubmit = async function(e) {
            e.preventDefault();
            const res = await fetch('/upload', { method: 'POST', body: new FormData(this) });
            const data = await res.json();
            document.getElementById('upload-status').textContent = data.message;
        };

        const chatBox = document.getElementById('chat-box');
        const chatInput = document.getElementById('chat-input');

        function appendMessage(sender, text) {
            const msg = document.createElement('div');
            const who = document.createElement('b');
            who.textContent = sender + ': ';
            msg.appendChild(who);
            msg.appendChild(document.createTextNode(text));
            chatBox.appendChild(msg);
            chatBox.scrollTop = chatBox.scrollHeight;
        }

        document.getElementById('send-btn').onclick = async function() {
            const message = chatInput.value.trim();
            if (!message) return;
            appendMessage('You', message);
            chatInput.value = '';
            const res = await fetch('/chat', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ message })
            });
            const data = await res.json();
            appendMessage('Server', data.reply);
        };
    </script>
</body>
</html>
"#;

/// Shared state for the front end routes
#[derive(Clone)]
pub struct FrontendState {
    pub upload_dir: Arc<PathBuf>,
    pub agent_url: Arc<String>,
    pub client: reqwest::Client,
}

impl FrontendState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.frontend.request_timeout_ms))
            .build()?;
        Ok(Self {
            upload_dir: Arc::new(config.paths.data_dir.clone()),
            agent_url: Arc::new(config.frontend.agent_service_url.clone()),
            client,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Strip directories and any character outside `[A-Za-z0-9._-]`.
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

pub fn is_csv_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Pull the reply text out of the agent service response
pub fn extract_reply_text(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => ["value", "output", "response", "reply"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

fn dir_has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageBody {
            message: message.to_string(),
        }),
    )
        .into_response()
}

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn upload_handler(
    State(state): State<FrontendState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return bad_request("No files part");
    };

    let mut saw_files_field = false;
    let mut saved = 0usize;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart upload: {}", e);
                return bad_request("Malformed upload");
            }
        };
        if field.name() != Some("files") {
            continue;
        }
        saw_files_field = true;

        let Some(name) = field.file_name().and_then(sanitize_filename) else {
            continue;
        };
        if !is_csv_name(&name) {
            info!("Ignoring non-CSV upload {}", name);
            continue;
        }
        let bytes = match field.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read upload {}: {}", name, e);
                return bad_request("Malformed upload");
            }
        };
        if let Err(e) = save_upload(&state.upload_dir, &name, &bytes).await {
            warn!("Failed to save upload {}: {}", name, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageBody {
                    message: format!("Failed to save {}", name),
                }),
            )
                .into_response();
        }
        saved += 1;
    }

    if !saw_files_field {
        return bad_request("No files part");
    }
    info!("Saved {} uploaded CSV file(s)", saved);
    Json(MessageBody {
        message: format!("{} file(s) uploaded successfully.", saved),
    })
    .into_response()
}

async fn save_upload(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(name), bytes).await?;
    Ok(())
}

/// Forward a chat message to the agent service and return its reply text
pub async fn relay_to_agent(state: &FrontendState, message: &str) -> Result<String> {
    let payload = json!({
        "input_message": message,
        "use_knowledge_base": true
    });
    let response = state
        .client
        .post(state.agent_url.as_str())
        .json(&payload)
        .send()
        .await
        .map_err(|e| DataPrepError::Downstream {
            message: e.to_string(),
        })?;
    let status = response.status();
    let body = response.text().await.map_err(|e| DataPrepError::Downstream {
        message: e.to_string(),
    })?;
    if !status.is_success() {
        return Err(DataPrepError::Downstream {
            message: format!("{}: {}", status, body),
        });
    }
    Ok(extract_reply_text(&body))
}

pub async fn chat_handler(
    State(state): State<FrontendState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if !dir_has_entries(&state.upload_dir) {
        return Json(ChatReply {
            reply: "please upload a file first".to_string(),
        })
        .into_response();
    }

    match relay_to_agent(&state, &request.message).await {
        Ok(reply) => Json(ChatReply { reply }).into_response(),
        Err(e) => {
            warn!("Agent service call failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ChatReply {
                    reply: format!("agent service error: {}", e),
                }),
            )
                .into_response()
        }
    }
}

pub fn build_router(state: FrontendState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/upload", post(upload_handler))
        .route("/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub async fn start_frontend(config: &Config) -> Result<()> {
    let state = FrontendState::from_config(config)?;
    tokio::fs::create_dir_all(state.upload_dir.as_path()).await?;
    let app = build_router(state);

    let bind = config.frontend.bind;
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| DataPrepError::Io {
            message: format!("Failed to bind front end on {}: {}", bind, e),
        })?;
    info!(
        "Front end listening on http://{} (agent service {})",
        bind, config.frontend.agent_service_url
    );
    axum::serve(listener, app)
        .await
        .map_err(|e| DataPrepError::Io {
            message: format!("Front end server error: {}", e),
        })?;
    Ok(())
}
