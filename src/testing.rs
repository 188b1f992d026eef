// In-process fakes of the dashboard and the Hub for tests
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const API_TOKEN: &str = "api-token";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin";
pub const HUB_TOKEN: &str = "hf-token";
pub const DATASET_ID: &str = "org/bench";

/// Write a benchmark case directory with a results file and a small config.
pub fn write_case(folder: &Path, name: &str, results: &str) {
    let dir = folder.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("inference_results.csv"), results).unwrap();
    fs::write(dir.join("hydra_config.yaml"), format!("model: {}\nbatch_size: 1\n", name)).unwrap();
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", token))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Default)]
pub struct DanaState {
    pub projects: HashMap<String, Value>,
    pub builds: HashMap<(String, u64), Value>,
    pub series: HashMap<(String, String), Value>,
    pub samples: HashMap<(String, String), HashMap<u64, f64>>,
    pub requests: Vec<(String, Value)>,
}

type SharedDana = Arc<Mutex<DanaState>>;

/// A dashboard that keeps its resources in memory.
pub struct FakeDana {
    pub url: String,
    state: SharedDana,
}

impl FakeDana {
    pub async fn start() -> Self {
        let state = SharedDana::default();
        let router = Router::new()
            .route("/login", post(login).get(|| async { "login page" }))
            .route("/admin", get(|| async { "dashboard" }))
            .route("/admin/addProject", post(add_project))
            .route("/apis/addBuild", post(add_build))
            .route("/apis/addSerie", post(add_series))
            .route("/apis/addSample", post(add_sample))
            .route("/apis/getBuild", get(get_build))
            .with_state(state.clone());

        Self {
            url: serve(router).await,
            state,
        }
    }

    pub fn state(&self) -> DanaState {
        self.state.lock().unwrap().clone()
    }
}

fn text(payload: &Value, key: &str) -> String {
    payload[key].as_str().unwrap_or_default().to_string()
}

fn overrides(payload: &Value) -> bool {
    payload["override"].as_bool().unwrap_or(false)
}

fn conflict() -> Response {
    (StatusCode::CONFLICT, "already exists").into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "bad token").into_response()
}

async fn login(Json(credentials): Json<Value>) -> Redirect {
    if credentials["username"] == USERNAME && credentials["password"] == PASSWORD {
        Redirect::to("/admin")
    } else {
        Redirect::to("/login")
    }
}

async fn add_project(State(state): State<SharedDana>, headers: HeaderMap, Json(payload): Json<Value>) -> Response {
    if !authorized(&headers, API_TOKEN) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(("/admin/addProject".to_string(), payload.clone()));

    let id = text(&payload, "projectId");
    if state.projects.contains_key(&id) && !overrides(&payload) {
        return conflict();
    }
    state.projects.insert(id, payload);
    StatusCode::OK.into_response()
}

async fn add_build(State(state): State<SharedDana>, headers: HeaderMap, Json(payload): Json<Value>) -> Response {
    if !authorized(&headers, API_TOKEN) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(("/apis/addBuild".to_string(), payload.clone()));

    let project_id = text(&payload, "projectId");
    if !state.projects.contains_key(&project_id) {
        return not_found();
    }
    let key = (project_id, payload["build"]["buildId"].as_u64().unwrap_or_default());
    if state.builds.contains_key(&key) && !overrides(&payload) {
        return conflict();
    }
    state.builds.insert(key, payload["build"].clone());
    StatusCode::OK.into_response()
}

async fn add_series(State(state): State<SharedDana>, headers: HeaderMap, Json(payload): Json<Value>) -> Response {
    if !authorized(&headers, API_TOKEN) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(("/apis/addSerie".to_string(), payload.clone()));

    let key = (text(&payload, "projectId"), text(&payload, "serieId"));
    if state.series.contains_key(&key) && !overrides(&payload) {
        return conflict();
    }
    state.series.insert(key, payload);
    StatusCode::OK.into_response()
}

async fn add_sample(State(state): State<SharedDana>, headers: HeaderMap, Json(payload): Json<Value>) -> Response {
    if !authorized(&headers, API_TOKEN) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(("/apis/addSample".to_string(), payload.clone()));

    let key = (text(&payload, "projectId"), text(&payload, "serieId"));
    if !state.series.contains_key(&key) {
        return not_found();
    }
    let build_id = payload["sample"]["buildId"].as_u64().unwrap_or_default();
    let value = payload["sample"]["value"].as_f64().unwrap_or_default();

    let samples = state.samples.entry(key).or_default();
    if samples.contains_key(&build_id) && !overrides(&payload) {
        return conflict();
    }
    samples.insert(build_id, value);
    StatusCode::OK.into_response()
}

async fn get_build(State(state): State<SharedDana>, headers: HeaderMap, Json(payload): Json<Value>) -> Response {
    if !authorized(&headers, API_TOKEN) {
        return unauthorized();
    }
    let state = state.lock().unwrap();

    let project_id = text(&payload, "projectId");
    if !state.projects.contains_key(&project_id) {
        return not_found();
    }
    let build_id = payload["buildId"].as_u64().unwrap_or_default();
    match state.builds.get(&(project_id, build_id)) {
        Some(build) => Json(build.clone()).into_response(),
        None => Json(json!({})).into_response(),
    }
}

#[derive(Debug, Default)]
struct HubState {
    files: BTreeMap<String, Vec<u8>>,
    commits: Vec<Vec<Value>>,
}

type SharedHub = Arc<Mutex<HubState>>;

/// A single dataset repository (`DATASET_ID`, revision `main`) served the way the
/// Hub API does.
pub struct FakeHub {
    pub url: String,
    state: SharedHub,
}

impl FakeHub {
    pub async fn start() -> Self {
        let state = SharedHub::default();
        let router = Router::new().fallback(hub).with_state(state.clone());
        Self {
            url: serve(router).await,
            state,
        }
    }

    pub fn seed(&self, path: &str, content: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), content.to_vec());
    }

    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn commits(&self) -> Vec<Vec<Value>> {
        self.state.lock().unwrap().commits.clone()
    }
}

async fn hub(State(state): State<SharedHub>, method: Method, uri: Uri, headers: HeaderMap, body: String) -> Response {
    if !authorized(&headers, HUB_TOKEN) {
        return unauthorized();
    }

    let tree = format!("/api/datasets/{}/tree/main", DATASET_ID);
    let commit = format!("/api/datasets/{}/commit/main", DATASET_ID);
    let resolve = format!("/datasets/{}/resolve/main/", DATASET_ID);
    let path = urlencoding::decode(uri.path()).unwrap().into_owned();
    let mut state = state.lock().unwrap();

    if method == Method::GET && path.starts_with(&tree) {
        let prefix = path[tree.len()..].trim_start_matches('/').to_string();
        let files: Vec<&String> = state
            .files
            .keys()
            .filter(|p| prefix.is_empty() || p.starts_with(&format!("{}/", prefix)))
            .collect();
        if !prefix.is_empty() && files.is_empty() {
            return not_found();
        }

        let mut dirs = BTreeSet::new();
        for file in &files {
            let mut parent = Path::new(file.as_str()).parent();
            while let Some(dir) = parent.filter(|d| !d.as_os_str().is_empty()) {
                dirs.insert(dir.to_string_lossy().into_owned());
                parent = dir.parent();
            }
        }
        let mut entries: Vec<Value> = dirs
            .into_iter()
            .map(|d| json!({"type": "directory", "path": d}))
            .collect();
        entries.extend(files.iter().map(|f| json!({"type": "file", "path": f})));
        return Json(entries).into_response();
    }

    if method == Method::POST && path == commit {
        let lines: Vec<Value> = body
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        for line in &lines {
            let target = line["value"]["path"].as_str().unwrap_or_default().to_string();
            match line["key"].as_str() {
                Some("deletedFile") => {
                    state.files.remove(&target);
                }
                Some("file") => {
                    let content = STANDARD
                        .decode(line["value"]["content"].as_str().unwrap_or_default())
                        .unwrap();
                    state.files.insert(target, content);
                }
                _ => {}
            }
        }
        state.commits.push(lines);
        return Json(json!({"success": true, "commitOid": "0000000"})).into_response();
    }

    if method == Method::GET && path.starts_with(&resolve) {
        return match state.files.get(&path[resolve.len()..]) {
            Some(content) => content.clone().into_response(),
            None => not_found(),
        };
    }

    not_found()
}
