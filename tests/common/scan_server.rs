//! In-process stand-in for the scanning service.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A canned HTTP reply.
#[derive(Clone, Debug)]
pub enum Reply {
    Json(StatusCode, Value),
    Raw(StatusCode, String),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Reply::Json(StatusCode::OK, body)
    }

    pub fn status(code: u16, body: &str) -> Self {
        Reply::Raw(
            StatusCode::from_u16(code).expect("valid status"),
            body.to_string(),
        )
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(code, body) => (code, axum::Json(body)).into_response(),
            Reply::Raw(code, body) => (code, body).into_response(),
        }
    }
}

/// What the upload handler saw.
#[derive(Clone, Debug, Default)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
struct Script {
    upload: Option<Reply>,
    // Replies served in order, the last one repeats
    results: VecDeque<Reply>,
    health: Option<Reply>,
    uploads: Vec<ReceivedUpload>,
    result_requests: Vec<String>,
}

#[derive(Clone, Default)]
pub struct ScanServer {
    script: Arc<Mutex<Script>>,
}

pub fn ack(task_id: &str) -> Value {
    json!({
        "task_id": task_id,
        "message": "Analysis started. Poll /result/{task_id} for status."
    })
}

pub fn completed(task_id: &str, score: u8, severity: &str) -> Value {
    json!({
        "file_id": task_id,
        "filename": "invoice.pdf",
        "status": "completed",
        "fraud_score": score,
        "severity": severity,
        "is_duplicate": false,
        "anomalies": [],
        "scanned_at": "2024-05-01T10:00:00Z",
        "processing_time": 412.0
    })
}

pub fn status_only(status: &str) -> Value {
    json!({ "status": status })
}

impl ScanServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_upload(self, reply: Reply) -> Self {
        self.script.lock().unwrap().upload = Some(reply);
        self
    }

    pub fn on_result(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.script.lock().unwrap().results = replies.into_iter().collect();
        self
    }

    pub fn on_health(self, reply: Reply) -> Self {
        self.script.lock().unwrap().health = Some(reply);
        self
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.script.lock().unwrap().uploads.clone()
    }

    pub fn result_requests(&self) -> Vec<String> {
        self.script.lock().unwrap().result_requests.clone()
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/v1/scan/upload", post(upload))
            .route("/api/v1/scan/result/:task_id", get(result))
            .route("/api/v1/health", get(health))
            .layer(DefaultBodyLimit::disable())
            .with_state(self.clone())
    }

    /// Serve on an ephemeral port; returns the API base address.
    pub async fn start(&self) -> (Url, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let app = self.router();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        let base = Url::parse(&format!("http://{addr}/api/v1/")).expect("base url");
        (base, handle)
    }
}

async fn upload(State(server): State<ScanServer>, mut multipart: Multipart) -> Reply {
    let mut received = ReceivedUpload::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Reply::status(400, &format!("multipart error: {e}")),
        };
        received.field = field.name().unwrap_or_default().to_string();
        received.file_name = field.file_name().map(str::to_string);
        received.content_type = field.content_type().map(str::to_string);
        received.size = match field.bytes().await {
            Ok(bytes) => bytes.len(),
            Err(e) => return Reply::status(400, &format!("multipart error: {e}")),
        };
    }

    let mut script = server.script.lock().unwrap();
    script.uploads.push(received);
    script
        .upload
        .clone()
        .unwrap_or_else(|| Reply::ok(ack("abc123")))
}

async fn result(State(server): State<ScanServer>, Path(task_id): Path<String>) -> Reply {
    let mut script = server.script.lock().unwrap();
    script.result_requests.push(task_id.clone());
    let reply = if script.results.len() > 1 {
        script.results.pop_front()
    } else {
        script.results.front().cloned()
    };
    reply.unwrap_or_else(|| Reply::ok(completed(&task_id, 12, "SAFE")))
}

async fn health(State(server): State<ScanServer>) -> Reply {
    let health = server.script.lock().unwrap().health.clone();
    health.unwrap_or_else(|| {
        Reply::ok(json!({
            "status": "healthy",
            "version": "1.0.0",
            "service": "fraudshield-api"
        }))
    })
}
