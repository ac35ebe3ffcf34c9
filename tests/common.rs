#![allow(dead_code)]

use axum::extract::{Form, Multipart, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
pub const WEBP_BYTES: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";
pub const GIF_BYTES: &[u8] = b"GIF89a\x01\0\x01\0";

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

pub fn write_config(dir: &Path, address: &str, extra: &str) -> PathBuf {
    let text = format!(
        "[typoraUploader]\n\
         noaHandlerAddr = {}\n\
         token = secret-token\n\
         bucket = pictures\n\
         workflow = typora\n\
         storageType = s3\n\
         retryBaseDelayMs = 1\n\
         retryMaxDelayMs = 5\n\
         {}\n",
        address, extra
    );
    write_file(dir, "config.ini", text.as_bytes())
}

/// Shell script standing in for cwebp. It copies the input to the output and
/// appends the output path to `cwebp.log` next to itself.
#[cfg(unix)]
pub fn fake_cwebp(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let log = dir.join("cwebp.log");
    let script = format!(
        "#!/bin/sh\n# -q 75 -m 6 -mt <in> -o <out>\ncp \"$6\" \"$8\" && echo \"$8\" >> \"{}\"\n",
        log.display()
    );
    let path = dir.join("cwebp");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Output paths the fake converter wrote, in call order.
pub fn converted_outputs(dir: &Path) -> Vec<PathBuf> {
    fs::read_to_string(dir.join("cwebp.log"))
        .map(|log| log.lines().map(PathBuf::from).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct MockReply {
    pub status_code: i64,
    pub message: String,
    pub file_url: String,
    /// Held before the reply is sent
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(file_url: &str) -> Self {
        Self {
            status_code: 200,
            message: String::new(),
            file_url: file_url.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn error(status_code: i64, message: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
            file_url: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub fields: BTreeMap<String, String>,
    pub file_field: Option<String>,
    pub file_name: Option<String>,
    pub file_bytes: Vec<u8>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
struct MockState {
    replies: Arc<Vec<MockReply>>,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
}

/// In-process NoaHandler stand-in. Replies are served in order and the last
/// one repeats.
pub struct MockGateway {
    pub base_url: String,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockGateway {
    pub fn start(replies: Vec<MockReply>) -> Self {
        assert!(!replies.is_empty());
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            replies: Arc::new(replies),
            uploads: uploads.clone(),
        };

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                let app = Router::new()
                    .route("/uploadFile", post(upload_file))
                    .route("/echo-form", post(echo_form))
                    .route("/echo-json", post(echo_json))
                    .with_state(state);
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });

        Self {
            base_url: format!("http://{}/", addr),
            uploads,
            shutdown: Some(shutdown),
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn upload_file(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut recorded = RecordedUpload {
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        ..RecordedUpload::default()
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            recorded.file_field = Some(name);
            recorded.file_name = Some(file_name);
            recorded.file_bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        } else {
            let value = field.text().await.unwrap_or_default();
            recorded.fields.insert(name, value);
        }
    }

    let reply = {
        let mut uploads = state.uploads.lock().unwrap();
        uploads.push(recorded);
        let index = (uploads.len() - 1).min(state.replies.len() - 1);
        state.replies[index].clone()
    };
    tokio::time::sleep(reply.delay).await;

    Json(json!({
        "statusCode": reply.status_code,
        "StatusString": reply.message,
        "fileUrl": reply.file_url,
    }))
}

async fn echo_form(Form(params): Form<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(params)
}

async fn echo_json(Json(params): Json<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(params)
}
