//! In-process picture server used by the HTTP tests.
//!
//! Stores folders in memory and mirrors the real server's behaviour:
//! rename-on-collision as `name_N.ext`, FastAPI-style `{"detail": ...}` errors,
//! and auto-created folders on upload.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use picman::api::ApiClient;

/// Uploads to this folder are refused with 422.
pub const LOCKED_FOLDER: &str = "locked";

type Store = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Clone, Default)]
pub struct MockServer {
    pub store: Arc<Mutex<Store>>,
    /// When set, `GET /folders` answers 500.
    pub failing: Arc<AtomicBool>,
    /// JSON bodies received by rename and duplicate, in arrival order.
    pub json_bodies: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `folder` with a file of `size` zero bytes.
    pub fn seed(&self, folder: &str, filename: &str, size: usize) {
        self.store
            .lock()
            .unwrap()
            .entry(folder.to_string())
            .or_default()
            .insert(filename.to_string(), vec![0u8; size]);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn file_names(&self, folder: &str) -> Vec<String> {
        self.store
            .lock()
            .unwrap()
            .get(folder)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn file(&self, folder: &str, filename: &str) -> Option<Vec<u8>> {
        self.store.lock().unwrap().get(folder)?.get(filename).cloned()
    }

    pub fn json_bodies(&self) -> Vec<serde_json::Value> {
        self.json_bodies.lock().unwrap().clone()
    }

    /// Bind to an ephemeral port and serve in the background. Returns the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub async fn client(&self) -> ApiClient {
        let base = self.spawn().await;
        ApiClient::new(&base, None).unwrap()
    }
}

fn router(state: MockServer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/folders", get(list_folders).post(create_folder))
        .route("/folders/{name}", get(folder_contents).delete(delete_folder))
        .route("/folders/{name}/info", get(folder_info))
        .route("/folders/{name}/rename", axum::routing::put(rename_folder))
        .route("/folders/{name}/duplicate", axum::routing::post(duplicate_folder))
        .route("/pictures", axum::routing::post(upload))
        .route(
            "/pictures/{folder}/{filename}",
            get(get_picture).put(replace_picture).delete(delete_picture),
        )
        .route("/pictures/{folder}/{filename}/info", get(picture_info))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn folder_json(name: &str, files: &BTreeMap<String, Vec<u8>>) -> serde_json::Value {
    let pictures: Vec<_> = files
        .iter()
        .map(|(filename, bytes)| {
            json!({
                "filename": filename,
                "size": bytes.len(),
                "path": format!("{}/{}", name, filename),
                "folder": name,
            })
        })
        .collect();
    json!({ "name": name, "pictures": pictures, "count": files.len() })
}

fn unique_name(files: &BTreeMap<String, Vec<u8>>, filename: &str) -> String {
    if !files.contains_key(filename) {
        return filename.to_string();
    }
    let path = PathBuf::from(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    (1..)
        .map(|n| format!("{stem}_{n}{ext}"))
        .find(|candidate| !files.contains_key(candidate))
        .unwrap()
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Picture Management API" }))
}

async fn list_folders(State(state): State<MockServer>) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable");
    }
    let store = state.store.lock().unwrap();
    let folders: serde_json::Map<_, _> = store
        .iter()
        .map(|(name, files)| (name.clone(), folder_json(name, files)))
        .collect();
    Json(json!({ "folders": folders })).into_response()
}

async fn create_folder(State(state): State<MockServer>, mut multipart: Multipart) -> Response {
    let mut name = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("folder_name") {
            name = Some(field.text().await.unwrap());
        }
    }
    let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
        return detail(StatusCode::BAD_REQUEST, "Folder name required");
    };
    let mut store = state.store.lock().unwrap();
    if store.contains_key(&name) {
        return detail(StatusCode::BAD_REQUEST, "Folder already exists");
    }
    store.insert(name.clone(), BTreeMap::new());
    Json(json!({ "message": "Folder created", "folder_name": name })).into_response()
}

async fn folder_contents(State(state): State<MockServer>, Path(name): Path<String>) -> Response {
    let store = state.store.lock().unwrap();
    match store.get(&name) {
        Some(files) => Json(folder_json(&name, files)).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Folder not found"),
    }
}

async fn delete_folder(State(state): State<MockServer>, Path(name): Path<String>) -> Response {
    let mut store = state.store.lock().unwrap();
    match store.remove(&name) {
        Some(files) => Json(json!({
            "message": "Folder deleted successfully",
            "folder_name": name,
            "files_deleted": files.len(),
        }))
        .into_response(),
        None => detail(StatusCode::NOT_FOUND, "Folder not found"),
    }
}

async fn folder_info(State(state): State<MockServer>, Path(name): Path<String>) -> Response {
    let store = state.store.lock().unwrap();
    match store.get(&name) {
        Some(files) => {
            let mut info = folder_json(&name, files);
            info["total_size"] = json!(files.values().map(Vec::len).sum::<usize>());
            info["created_at"] = json!("2024-01-01T00:00:00");
            info["modified_at"] = json!("2024-01-02T00:00:00");
            Json(info).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Folder not found"),
    }
}

async fn rename_folder(
    State(state): State<MockServer>,
    Path(name): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.json_bodies.lock().unwrap().push(body.clone());
    let Some(new_name) = body["new_name"].as_str().map(str::to_string) else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "new_name is required");
    };
    let mut store = state.store.lock().unwrap();
    if store.contains_key(&new_name) {
        return detail(StatusCode::BAD_REQUEST, "Folder already exists");
    }
    match store.remove(&name) {
        Some(files) => {
            store.insert(new_name.clone(), files);
            Json(json!({
                "message": "Folder renamed successfully",
                "old_name": name,
                "new_name": new_name,
            }))
            .into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Folder not found"),
    }
}

/// A `null` name copies to `<name>_copy`, then `<name>_copy_N`.
async fn duplicate_folder(
    State(state): State<MockServer>,
    Path(name): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.json_bodies.lock().unwrap().push(body.clone());
    let mut store = state.store.lock().unwrap();
    let Some(files) = store.get(&name).cloned() else {
        return detail(StatusCode::NOT_FOUND, "Folder not found");
    };
    let new_name = match body["new_name"].as_str() {
        Some(requested) => {
            if store.contains_key(requested) {
                return detail(StatusCode::BAD_REQUEST, "Folder already exists");
            }
            requested.to_string()
        }
        None => std::iter::once(format!("{name}_copy"))
            .chain((1..).map(|n| format!("{name}_copy_{n}")))
            .find(|candidate| !store.contains_key(candidate))
            .unwrap(),
    };
    store.insert(new_name.clone(), files);
    Json(json!({
        "message": "Folder duplicated successfully",
        "original_folder": name,
        "new_folder": new_name,
    }))
    .into_response()
}

async fn picture_info(
    State(state): State<MockServer>,
    Path((folder, filename)): Path<(String, String)>,
) -> Response {
    match state.file(&folder, &filename) {
        Some(bytes) => Json(json!({
            "filename": filename,
            "size": bytes.len(),
            "path": format!("{}/{}", folder, filename),
            "folder": folder,
            "modified_at": "2024-01-02T00:00:00",
            "mime_type": "image/png",
        }))
        .into_response(),
        None => detail(StatusCode::NOT_FOUND, "Picture not found"),
    }
}

async fn upload(State(state): State<MockServer>, mut multipart: Multipart) -> Response {
    let mut folder = None;
    let mut incoming = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("folder_name") => folder = Some(field.text().await.unwrap()),
            Some("files") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap().to_vec();
                incoming.push((filename, bytes));
            }
            _ => {}
        }
    }
    if incoming.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "No files provided");
    }
    let folder = folder.unwrap_or_else(|| "2024-01-01_00-00-00".to_string());
    if folder == LOCKED_FOLDER {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Folder is locked");
    }

    let mut store = state.store.lock().unwrap();
    let files = store.entry(folder.clone()).or_default();
    let mut uploaded = Vec::new();
    for (original, bytes) in incoming {
        let stored = unique_name(files, &original);
        uploaded.push(json!({
            "filename": stored,
            "original_name": original,
            "renamed": stored != original,
        }));
        files.insert(stored, bytes);
    }
    Json(json!({
        "uploaded": uploaded,
        "folder": folder,
        "total_files": uploaded.len(),
        "errors": [],
    }))
    .into_response()
}

async fn get_picture(
    State(state): State<MockServer>,
    Path((folder, filename)): Path<(String, String)>,
) -> Response {
    match state.file(&folder, &filename) {
        Some(bytes) => ([("content-type", "image/png")], bytes).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Picture not found"),
    }
}

async fn replace_picture(
    State(state): State<MockServer>,
    Path((folder, filename)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Response {
    let mut content = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("file") {
            content = Some(field.bytes().await.unwrap().to_vec());
        }
    }
    let Some(content) = content else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "file is required");
    };
    let mut store = state.store.lock().unwrap();
    match store.get_mut(&folder).and_then(|files| files.get_mut(&filename)) {
        Some(existing) => {
            *existing = content;
            Json(json!({ "message": "Picture updated successfully", "filename": filename })).into_response()
        }
        None => detail(StatusCode::NOT_FOUND, "Picture not found"),
    }
}

async fn delete_picture(
    State(state): State<MockServer>,
    Path((folder, filename)): Path<(String, String)>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    match store.get_mut(&folder).and_then(|files| files.remove(&filename)) {
        Some(_) => Json(json!({ "message": "Picture deleted successfully" })).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Picture not found"),
    }
}

/// Write `size` bytes to `dir/name` and return the path.
pub fn write_file(dir: &std::path::Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![7u8; size]).unwrap();
    path
}
