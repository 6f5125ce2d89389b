//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/reports` | All reports ordered by name, or ranked hits with `?searchTerm=` |
//! | `GET`  | `/reports/{id}` | Full report including text |
//! | `GET`  | `/reports/{id}/tags` | Tag associations ordered by tag name |
//! | `GET`  | `/reports/{id}/tagLists` | Active / inactive / unassigned partition |
//! | `PUT`  | `/reports/{id}/tags` | Replace the report's tag associations |
//! | `GET`  | `/tags` | The tag catalog |
//! | `GET`  | `/ingestion` | Summary of the startup ingestion run |
//! | `GET`  | `/health` | Store ping and version |
//!
//! The documents directory is also served as static files under
//! `[server].static_route`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "report 42 not found" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `store_unavailable`
//! (503), `index_unavailable` (503), `timeout` (504), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, ErrorKind};
use crate::get::get_report;
use crate::index::{self, SearchIndex};
use crate::ingest::{IngestSummary, Reconciler};
use crate::models::{Report, ReportTag, Tag, TagAssignment, TagLists};
use crate::repository::{ReportRepository, SqliteRepository};
use crate::search::{search_reports, SearchResults};
use crate::tags;
use crate::{db, migrate};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn ReportRepository>,
    index: Arc<dyn SearchIndex>,
    ingestion: Arc<IngestSummary>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn ReportRepository>,
        index: Arc<dyn SearchIndex>,
        ingestion: IngestSummary,
    ) -> Self {
        Self {
            repo,
            index,
            ingestion: Arc::new(ingestion),
        }
    }
}

/// Build the API router, serving `static_dir` under `static_route`.
pub fn router(state: AppState, static_route: &str, static_dir: &FsPath) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/reports", get(handle_list_reports))
        .route("/reports/{id}", get(handle_get_report))
        .route(
            "/reports/{id}/tags",
            get(handle_get_report_tags).put(handle_put_report_tags),
        )
        .route("/reports/{id}/tagLists", get(handle_get_tag_lists))
        .route("/tags", get(handle_list_tags))
        .route("/ingestion", get(handle_ingestion))
        .route("/health", get(handle_health))
        .nest_service(static_route, ServeDir::new(static_dir))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Opens the store, applies the schema, reconciles the documents directory,
/// and only then binds `[server].bind`. Runs until Ctrl-C, then closes the
/// store pool.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let repo = Arc::new(SqliteRepository::new(pool));
    let index = index::create_index(&config.index)?;

    let summary = Reconciler::new(repo.as_ref(), index.as_ref(), &config.documents)
        .reconcile_all()
        .await?;

    let state = AppState::new(repo.clone(), index, summary);
    let app = router(state, &config.server.static_route, &config.documents.root);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repo.close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
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

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let (status, code) = match err.kind() {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ErrorKind::MalformedInput => (StatusCode::BAD_REQUEST, "bad_request"),
            ErrorKind::StoreUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            ErrorKind::IndexUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "index_unavailable"),
            ErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            error!(error = %err, code, "request failed");
        }
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::from(Error::MalformedInput(format!("invalid report id: {}", raw))))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.repo.ping().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

// ============ GET /ingestion ============

async fn handle_ingestion(State(state): State<AppState>) -> Json<IngestSummary> {
    Json(state.ingestion.as_ref().clone())
}

// ============ GET /reports ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportsQuery {
    search_term: Option<String>,
}

async fn handle_list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let results = search_reports(
        state.repo.as_ref(),
        state.index.as_ref(),
        query.search_term.as_deref(),
    )
    .await?;
    Ok(Json(results))
}

// ============ GET /reports/{id} ============

async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Report>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(get_report(state.repo.as_ref(), id).await?))
}

// ============ GET /reports/{id}/tags ============

async fn handle_get_report_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReportTag>>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.repo.list_tags_for_report(id).await?))
}

// ============ GET /reports/{id}/tagLists ============

async fn handle_get_tag_lists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TagLists>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(tags::tag_lists(state.repo.as_ref(), id).await?))
}

// ============ PUT /reports/{id}/tags ============

/// Unknown report ids answer 400 here rather than 404.
async fn handle_put_report_tags(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Vec<TagAssignment>>, JsonRejection>,
) -> Result<(StatusCode, String), AppError> {
    let id = parse_id(&id)?;
    let Json(client) = payload.map_err(|e| bad_request(format!("invalid tag list: {}", e)))?;

    match tags::update_report_tags(state.repo.as_ref(), id, &client).await {
        Ok(_) => Ok((
            StatusCode::OK,
            format!("Successfully updated the tags for report {}.", id),
        )),
        Err(Error::NotFound(what)) => Err(bad_request(format!("{} does not exist", what))),
        Err(e) => Err(e.into()),
    }
}

// ============ GET /tags ============

async fn handle_list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(state.repo.list_tags().await?))
}
