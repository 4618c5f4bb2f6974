use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub mod tls;

/// Body returned for every unknown record id.
pub const NOT_FOUND_BODY: &str = "not found";

/// Body of `/raw/{code}`. Deliberately not valid UTF-8.
pub const RAW_BODY: &[u8] = &[0xFF, b'o', b'k'];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

#[derive(Deserialize)]
pub struct CreateRecord {
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Deserialize)]
pub struct UpdateRecord {
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

#[derive(Deserialize)]
pub struct SlowParams {
    #[serde(default)]
    pub ms: u64,
}

/// Shared server state. Cloning shares the record store and the hit counter.
#[derive(Clone, Default)]
pub struct AppState {
    records: Arc<RwLock<HashMap<Uuid, Record>>>,
    hits: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests that reached a route so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn app() -> Router {
    router(AppState::new())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .route(
            "/records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/echo", any(echo))
        .route("/reply/{code}", any(reply))
        .route("/raw/{code}", any(raw))
        .route("/slow", get(slow))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, AppState::new()).await
}

/// Serve with caller-owned state, so tests can inspect the hit counter.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

async fn count_hits(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

async fn list_records(State(state): State<AppState>) -> Json<Vec<Record>> {
    let records = state.records.read().await;
    Json(records.values().cloned().collect())
}

async fn create_record(
    State(state): State<AppState>,
    Json(input): Json<CreateRecord>,
) -> Json<Record> {
    let record = Record {
        id: Uuid::new_v4(),
        name: input.name,
        active: input.active,
    };
    state.records.write().await.insert(record.id, record.clone());
    Json(record)
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Record>, (StatusCode, &'static str)> {
    let records = state.records.read().await;
    records
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND_BODY))
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRecord>,
) -> Result<Json<Record>, (StatusCode, &'static str)> {
    let mut records = state.records.write().await;
    let record = records
        .get_mut(&id)
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND_BODY))?;
    if let Some(name) = input.name {
        record.name = name;
    }
    if let Some(active) = input.active {
        record.active = active;
    }
    Ok(Json(record.clone()))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Record>, (StatusCode, &'static str)> {
    let mut records = state.records.write().await;
    records
        .remove(&id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, NOT_FOUND_BODY))
}

async fn echo(
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        content_type,
        body: (!body.is_empty()).then_some(body),
    })
}

/// Respond with status `code` and the `body` query parameter verbatim.
async fn reply(
    Path(code): Path<u16>,
    Query(mut query): Query<HashMap<String, String>>,
) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return (StatusCode::BAD_REQUEST, "invalid status code").into_response();
    };
    let body = query.remove("body").unwrap_or_default();
    (status, body).into_response()
}

/// Respond with status `code` and `RAW_BODY` as an octet stream.
async fn raw(Path(code): Path<u16>) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return (StatusCode::BAD_REQUEST, "invalid status code").into_response();
    };
    (
        status,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        RAW_BODY,
    )
        .into_response()
}

async fn slow(Query(params): Query<SlowParams>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(params.ms)).await;
    Json(serde_json::json!({}))
}
