use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use search_core::corpus::{builder_from, load_corpus};
use search_core::{BooleanMatch, DocId, Index, IndexHandle, Normalizer, NormalizerConfig, SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
    /// Set when the query normalized to nothing and could not be evaluated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub total_hits: usize,
    pub results: Vec<BooleanMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_term: Option<String>,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub doc_id: DocId,
    pub identifier: String,
    pub title: String,
    pub token_count: usize,
    pub magnitude: f64,
    pub vector: BTreeMap<String, f64>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub num_docs: u32,
    pub vocabulary_size: usize,
    pub stemmer: String,
}

/// Settings the router needs besides the index itself.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Corpus reloaded by `POST /index/rebuild`.
    pub corpus: Option<PathBuf>,
    pub normalizer: NormalizerConfig,
    pub admin_token: Option<String>,
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    /// Read `ADMIN_TOKEN` and `CORS_ALLOW_ORIGIN` from the environment.
    pub fn from_env(corpus: Option<PathBuf>, normalizer: NormalizerConfig) -> Self {
        Self {
            corpus,
            normalizer,
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<IndexHandle>,
    pub config: Arc<ServerConfig>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: error.into(), missing_term: None }))
}

/// Load the configured corpus, build the index and return the router.
pub fn build_app(config: ServerConfig) -> Result<Router> {
    let index = match &config.corpus {
        Some(path) => load_index(path, &config.normalizer)?,
        None => Index::new(),
    };
    Ok(router(Arc::new(IndexHandle::new(index)), config))
}

fn load_index(path: &FsPath, normalizer: &NormalizerConfig) -> Result<Index> {
    let docs = load_corpus(path)?;
    Ok(builder_from(Normalizer::from_config(normalizer), docs).build())
}

pub fn router(index: Arc<IndexHandle>, config: ServerConfig) -> Router {
    let cors = match &config.cors_allow_origin {
        Some(val) => {
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
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let state = AppState { index, config: Arc::new(config) };
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/search/boolean", get(boolean_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// `NoValidTerms` never reaches here: handlers answer it with an empty result.
fn status_for(err: &SearchError) -> StatusCode {
    match err {
        SearchError::IndexNotReady => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::NoValidTerms => StatusCode::OK,
        SearchError::MissingTerm { .. } => StatusCode::NOT_FOUND,
    }
}

fn search_error(err: SearchError) -> ApiError {
    let status = status_for(&err);
    let missing_term = match &err {
        SearchError::MissingTerm { term } => Some(term.clone()),
        _ => None,
    };
    (status, Json(ErrorBody { error: err.to_string(), missing_term }))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let index = state.index.snapshot();
    let (ranked, reason) = match index.try_ranked_search(&params.q) {
        Ok(ranked) => (ranked, None),
        Err(err @ SearchError::NoValidTerms) => (Vec::new(), Some(err.to_string())),
        Err(err) => return Err(search_error(err)),
    };
    let total_hits = ranked.len();
    let k = params.k.clamp(1, 100);
    let results: Vec<SearchResult> = ranked.into_iter().take(k).collect();
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results, reason }))
}

pub async fn boolean_handler(State(state): State<AppState>, Query(params): Query<BooleanParams>) -> Result<Json<BooleanResponse>, ApiError> {
    let index = state.index.snapshot();
    let (results, reason) = match index.boolean_and_search(&params.q) {
        Ok(results) => (results, None),
        Err(err @ SearchError::NoValidTerms) => (Vec::new(), Some(err.to_string())),
        Err(err) => return Err(search_error(err)),
    };
    Ok(Json(BooleanResponse { query: params.q, total_hits: results.len(), results, reason }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<DocResponse>, ApiError> {
    let index = state.index.snapshot();
    let doc = index
        .document(doc_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("document {doc_id} not found")))?;
    Ok(Json(DocResponse {
        doc_id,
        identifier: doc.source_identifier.clone(),
        title: doc.title.clone(),
        token_count: doc.token_count,
        magnitude: index.document_magnitude(doc_id),
        vector: index.document_vector(doc_id),
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let index = state.index.snapshot();
    Json(StatsResponse {
        num_docs: index.document_count(),
        vocabulary_size: index.vocabulary_size(),
        stemmer: index.normalizer().stemmer_name().to_string(),
    })
}

/// Rebuild from the configured corpus and publish the new index as a whole.
async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<StatsResponse>, ApiError> {
    authorize(&state, &headers)?;
    let corpus = state
        .config
        .corpus
        .clone()
        .ok_or_else(|| api_error(StatusCode::CONFLICT, "no corpus configured"))?;
    let normalizer = state.config.normalizer;
    let docs = tokio::task::spawn_blocking(move || load_corpus(&corpus))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    let handle = Arc::clone(&state.index);
    let live = tokio::task::spawn_blocking(move || handle.rebuild(builder_from(Normalizer::from_config(&normalizer), docs)))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(StatsResponse {
        num_docs: live.document_count(),
        vocabulary_size: live.vocabulary_size(),
        stemmer: live.normalizer().stemmer_name().to_string(),
    }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.config.admin_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
