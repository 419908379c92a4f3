//! In-memory stand-in for the JS Bin API.
//!
//! Serves the same routes as the real service from the root path, so a client
//! pointed at `http://<addr>/` behaves as it would against
//! `https://jsbin.com/api/`. Removed bins stay listed with a `deleted/` url
//! prefix; errors are `{"error": "..."}` bodies.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

const SUMMARY_LEN: usize = 60;

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub snapshot: u32,
    pub javascript: String,
    pub html: String,
    pub css: String,
    pub settings: Map<String, Value>,
    pub last_updated: DateTime<Utc>,
    pub removed: bool,
}

impl Snapshot {
    fn title(&self) -> Option<&str> {
        self.settings
            .get("title")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
    }
}

#[derive(Clone, Debug)]
pub struct Bin {
    pub id: String,
    pub snapshots: Vec<Snapshot>,
    pub deleted: bool,
}

impl Bin {
    fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.iter().rev().find(|s| !s.removed)
    }

    fn live(&self, number: u32) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.snapshot == number && !s.removed)
    }

    fn listed_url(&self) -> String {
        if self.deleted {
            format!("deleted/{}", self.id)
        } else {
            self.id.clone()
        }
    }
}

pub type Db = Arc<RwLock<Vec<Bin>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub token: Option<String>,
}

/// One element of a `GET /` entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListedSnapshot {
    pub url: String,
    pub snapshot: u32,
    pub title: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub pretty_last_updated: String,
}

/// Body of `POST /save` and `POST /{bin}/save`.
#[derive(Debug, Deserialize)]
pub struct SaveBody {
    #[serde(default)]
    pub settings: Option<String>,
    #[serde(default)]
    pub javascript: Option<String>,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

pub fn app() -> Router {
    app_with_token(None)
}

/// Router that rejects requests lacking `authorization: token <token>`.
pub fn app_with_token(token: Option<String>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Vec::new())),
        token,
    };
    Router::new()
        .route("/", get(list_bins))
        .route("/save", post(create_bin))
        .route("/{bin}", get(read_latest).delete(remove_bin))
        .route("/{bin}/save", post(save_snapshot))
        .route("/{bin}/{snapshot}", get(read_snapshot).delete(remove_snapshot))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(token) = &state.token else {
        return Ok(());
    };
    let expected = format!("token {token}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(ApiError::new(StatusCode::UNAUTHORIZED, "a valid token is required")),
    }
}

async fn list_bins(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    authorize(&state, &headers)?;
    let now = Utc::now();
    let bins = state.db.read().await;
    let entries: Vec<Vec<ListedSnapshot>> = bins
        .iter()
        .rev()
        .filter(|bin| bin.latest().is_some())
        .map(|bin| {
            let url = bin.listed_url();
            bin.snapshots
                .iter()
                .rev()
                .filter(|s| !s.removed)
                .map(|s| ListedSnapshot {
                    url: url.clone(),
                    snapshot: s.snapshot,
                    title: s.title().map(str::to_string),
                    last_updated: s.last_updated,
                    pretty_last_updated: pretty_age(s.last_updated, now),
                })
                .collect()
        })
        .collect();
    Ok(Json(json!(entries)))
}

async fn read_latest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bin_id): Path<String>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let bins = state.db.read().await;
    let bin = find_live(&bins, &bin_id)?;
    let snapshot = bin.latest().ok_or_else(|| ApiError::not_found("bin"))?;
    Ok(Json(content_json(bin, snapshot)))
}

async fn read_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((bin_id, number)): Path<(String, u32)>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let bins = state.db.read().await;
    let bin = find_live(&bins, &bin_id)?;
    let snapshot = bin.live(number).ok_or_else(|| ApiError::not_found("snapshot"))?;
    Ok(Json(content_json(bin, snapshot)))
}

async fn create_bin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SaveBody>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let snapshot = snapshot_from(body, 1)?;
    let mut bins = state.db.write().await;
    let id = fresh_id(&bins);
    let result = save_result(&id, &snapshot);
    info!(bin = %id, "created bin");
    bins.push(Bin {
        id,
        snapshots: vec![snapshot],
        deleted: false,
    });
    Ok(Json(result))
}

async fn save_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bin_id): Path<String>,
    Json(body): Json<SaveBody>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let mut bins = state.db.write().await;
    let bin = find_live_mut(&mut bins, &bin_id)?;
    let next = bin.snapshots.last().map_or(1, |s| s.snapshot + 1);
    let snapshot = snapshot_from(body, next)?;
    let result = save_result(&bin.id, &snapshot);
    info!(bin = %bin.id, snapshot = next, "saved snapshot");
    bin.snapshots.push(snapshot);
    Ok(Json(result))
}

async fn remove_bin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bin_id): Path<String>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let mut bins = state.db.write().await;
    let bin = find_live_mut(&mut bins, &bin_id)?;
    let snapshot = bin.latest().map_or(0, |s| s.snapshot);
    bin.deleted = true;
    info!(bin = %bin.id, "removed bin");
    Ok(Json(json!({ "url": bin.id, "snapshot": snapshot, "deleted": true })))
}

async fn remove_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((bin_id, number)): Path<(String, u32)>,
) -> ApiResult {
    authorize(&state, &headers)?;
    let mut bins = state.db.write().await;
    let bin = find_live_mut(&mut bins, &bin_id)?;
    let snapshot = bin
        .snapshots
        .iter_mut()
        .find(|s| s.snapshot == number && !s.removed)
        .ok_or_else(|| ApiError::not_found("snapshot"))?;
    snapshot.removed = true;
    info!(bin = %bin_id, snapshot = number, "removed snapshot");
    Ok(Json(json!({ "url": bin_id, "snapshot": number, "deleted": true })))
}

fn find_live<'a>(bins: &'a [Bin], bin_id: &str) -> Result<&'a Bin, ApiError> {
    bins.iter()
        .find(|bin| bin.id == bin_id && !bin.deleted)
        .ok_or_else(|| ApiError::not_found("bin"))
}

fn find_live_mut<'a>(bins: &'a mut [Bin], bin_id: &str) -> Result<&'a mut Bin, ApiError> {
    bins.iter_mut()
        .find(|bin| bin.id == bin_id && !bin.deleted)
        .ok_or_else(|| ApiError::not_found("bin"))
}

fn snapshot_from(body: SaveBody, number: u32) -> Result<Snapshot, ApiError> {
    let settings = match body.settings.as_deref().map(str::trim) {
        None | Some("") => Map::new(),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "settings must be a JSON encoded object",
                ))
            }
        },
    };
    Ok(Snapshot {
        snapshot: number,
        javascript: body.javascript.unwrap_or_default(),
        html: body.html.unwrap_or_default(),
        css: body.css.unwrap_or_default(),
        settings,
        last_updated: Utc::now(),
        removed: false,
    })
}

fn content_json(bin: &Bin, snapshot: &Snapshot) -> Value {
    json!({
        "javascript": snapshot.javascript,
        "html": snapshot.html,
        "css": snapshot.css,
        "settings": snapshot.settings,
        "last_updated": snapshot.last_updated,
        "url": bin.id,
        "snapshot": snapshot.snapshot,
    })
}

fn save_result(id: &str, snapshot: &Snapshot) -> Value {
    json!({ "url": id, "snapshot": snapshot.snapshot, "summary": summarize(snapshot) })
}

/// The title, or else the first non-blank source line, clipped.
pub fn summarize(snapshot: &Snapshot) -> String {
    if let Some(title) = snapshot.title() {
        return title.to_string();
    }
    [&snapshot.html, &snapshot.javascript, &snapshot.css]
        .into_iter()
        .flat_map(|source| source.lines())
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(SUMMARY_LEN).collect())
        .unwrap_or_default()
}

pub fn pretty_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let (count, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3599 => (secs / 60, "minute"),
        3600..=86_399 => (secs / 3600, "hour"),
        _ => (secs / 86_400, "day"),
    };
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

fn fresh_id(bins: &[Bin]) -> String {
    loop {
        let id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        if !bins.iter().any(|bin| bin.id == id) {
            return id;
        }
    }
}
