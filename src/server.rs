//! JSON HTTP API over the current dataset snapshot.
//!
//! Exposes the name list, fuzzy search and progression series to an
//! external chart renderer, plus a reload endpoint that re-reads the
//! configured CSV.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (version, row count, fingerprint) |
//! | `GET`  | `/names` | Sorted distinct lifter names |
//! | `GET`  | `/search?q=&limit=` | Ranked fuzzy matches with scores |
//! | `GET`  | `/progression?name=&lifts=&unit=&equipment=&fuzzy=` | Chart series for one lifter |
//! | `POST` | `/reload` | Re-ingest the source and swap the snapshot |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "q must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).
//!
//! # Snapshots
//!
//! Handlers clone an `Arc<LoadedDataset>` out of a read lock and work on
//! that, so a reload never blocks a query for longer than the pointer swap
//! and a query never sees a half-built dataset. Reloads are serialized.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use lift_progression_core::fuzzy::NameMatch;
use lift_progression_core::models::{Lift, Unit};
use lift_progression_core::query::{resolve_selection, EquipmentFilter, Progression, ProgressionQuery};

use crate::config::Config;
use crate::progress::NoProgress;
use crate::source::{self, LoadedDataset};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    snapshot: Arc<RwLock<Arc<LoadedDataset>>>,
    /// Held for the whole of a reload so only one runs at a time.
    reload_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, loaded: LoadedDataset) -> Self {
        Self {
            config: Arc::new(config),
            snapshot: Arc::new(RwLock::new(Arc::new(loaded))),
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The current snapshot.
    pub async fn current(&self) -> Arc<LoadedDataset> {
        self.snapshot.read().await.clone()
    }

    /// Re-read the configured source and swap it in.
    pub async fn reload(&self) -> anyhow::Result<ReloadResponse> {
        let _guard = self.reload_lock.lock().await;

        let config = self.config.clone();
        let fresh = tokio::task::spawn_blocking(move || source::load_dataset(&config, &NoProgress)).await??;

        let previous = self.current().await.fingerprint.clone();
        let response = ReloadResponse {
            rows: fresh.dataset.len(),
            lifters: fresh.dataset.names().len(),
            changed: fresh.fingerprint != previous,
            fingerprint: fresh.fingerprint.clone(),
        };

        *self.snapshot.write().await = Arc::new(fresh);
        info!(rows = response.rows, changed = response.changed, "dataset reloaded");
        Ok(response)
    }
}

/// Build the router. Split out from [`run_server`] so it can be served on
/// any listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/names", get(handle_names))
        .route("/search", get(handle_search))
        .route("/progression", get(handle_progression))
        .route("/reload", post(handle_reload))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config, loaded: LoadedDataset) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let rows = loaded.dataset.len();
    let app = router(AppState::new(config.clone(), loaded));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, rows, "server listening");
    println!("liftprog server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    rows: usize,
    fingerprint: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let loaded = state.current().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rows: loaded.dataset.len(),
        fingerprint: loaded.fingerprint.clone(),
    })
}

// ============ GET /names ============

#[derive(Serialize)]
struct NamesResponse {
    names: Vec<String>,
}

async fn handle_names(State(state): State<AppState>) -> Json<NamesResponse> {
    let loaded = state.current().await;
    Json(NamesResponse {
        names: loaded.dataset.list_names().to_vec(),
    })
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    matches: Vec<NameMatch>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(bad_request("q must not be empty"));
    }
    let limit = params.limit.unwrap_or(state.config.search.limit);
    if limit == 0 {
        return Err(bad_request("limit must be >= 1"));
    }

    let loaded = state.current().await;
    Ok(Json(SearchResponse {
        matches: loaded.dataset.search_scored(&query, limit),
    }))
}

// ============ GET /progression ============

#[derive(Deserialize)]
struct ProgressionParams {
    name: Option<String>,
    /// Comma-separated lift names.
    lifts: Option<String>,
    unit: Option<String>,
    equipment: Option<String>,
    #[serde(default)]
    fuzzy: bool,
}

/// Parse the request's overrides on top of the config defaults.
fn parse_progression_params(
    config: &Config,
    params: &ProgressionParams,
) -> Result<(Vec<Lift>, Unit, EquipmentFilter), AppError> {
    let lifts = match params.lifts.as_deref().map(str::trim) {
        Some(list) if !list.is_empty() => list
            .split(',')
            .map(|l| l.parse::<Lift>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| bad_request(e.to_string()))?,
        Some(_) => Vec::new(),
        None => config.query.lifts().map_err(|e| internal(e.to_string()))?,
    };
    let unit = match params.unit.as_deref() {
        Some(u) => u.parse::<Unit>().map_err(|e| bad_request(e.to_string()))?,
        None => config.query.unit().map_err(|e| internal(e.to_string()))?,
    };
    let equipment = match params.equipment.as_deref() {
        Some(e) => e
            .parse::<EquipmentFilter>()
            .map_err(|e| bad_request(e.to_string()))?,
        None => config.query.equipment().map_err(|e| internal(e.to_string()))?,
    };
    Ok((lifts, unit, equipment))
}

async fn handle_progression(
    State(state): State<AppState>,
    Query(params): Query<ProgressionParams>,
) -> Result<Json<Progression>, AppError> {
    let name = params.name.clone().unwrap_or_default();
    if name.trim().is_empty() {
        return Err(bad_request("name must not be empty"));
    }
    let (lifts, unit, equipment) = parse_progression_params(&state.config, &params)?;

    let loaded = state.current().await;
    let dataset = &loaded.dataset;
    // An unknown name is not an error: the series list comes back empty.
    let resolved = if params.fuzzy {
        resolve_selection(dataset, Some(name.as_str()), None)
    } else {
        None
    };
    let lifter = resolved.unwrap_or(name);

    let query = ProgressionQuery::new(lifter, equipment, unit, lifts);
    Ok(Json(dataset.progression(&query)))
}

// ============ POST /reload ============

#[derive(Serialize)]
pub struct ReloadResponse {
    pub rows: usize,
    pub lifters: usize,
    pub fingerprint: String,
    pub changed: bool,
}

async fn handle_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    state.reload().await.map(Json).map_err(|e| {
        error!(error = %e, "reload failed");
        internal(format!("reload failed: {:#}", e))
    })
}
