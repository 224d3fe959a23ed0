use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use index_core::{Article, FsStorage, QueryResult, SearchSnapshot};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    /// Truncates the returned slice only; `total_hits` still counts every hit.
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<QueryResult>,
}

/// Where the snapshot is loaded from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub root: PathBuf,
    pub index_path: String,
    pub corpus_path: String,
}

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<SearchSnapshot>,
}

/// Load index and corpus once, then build the router around them. A missing
/// or unreadable index or corpus fails startup.
pub fn build_app(config: &SourceConfig) -> Result<Router> {
    let storage = FsStorage::open(&config.root)?;
    let snapshot = SearchSnapshot::open(&storage, &config.index_path, &config.corpus_path)?;
    storage.close();
    Ok(router(snapshot))
}

pub fn router(snapshot: SearchSnapshot) -> Router {
    let app_state = AppState { snapshot: Arc::new(snapshot) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/article/:uuid", get(article_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let mut results = state.snapshot.search(&params.q);
    let total_hits = results.len();
    if let Some(limit) = params.limit {
        results.truncate(limit);
    }
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "search served");
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results })
}

pub async fn article_handler(State(state): State<AppState>, Path(uuid): Path<String>) -> Result<Json<Article>, (StatusCode, String)> {
    state
        .snapshot
        .article(&uuid)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("article {uuid} not found")))
}
