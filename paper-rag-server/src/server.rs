use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use paper_rag::{RagError, RagService};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::protocol::{ErrorResponse, QueryRequest, QueryResponse, RetrieveResponse};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RagService>,
}

impl AppState {
    pub fn new(service: RagService) -> Self {
        Self { service: Arc::new(service) }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000 }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/retrieve", post(retrieve))
        .route("/query", post(query))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for paper-rag server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("paper-rag listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: RagError) -> ApiError {
    let status = match &err {
        RagError::Generation { .. } => StatusCode::BAD_GATEWAY,
        RagError::Configuration { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(%status, error = %err, "request failed");
    (status, Json(ErrorResponse { error: err.to_string() }))
}

fn reject_blank(request: &QueryRequest) -> Result<(), ApiError> {
    if request.question.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: "question cannot be empty".to_string() }),
        ));
    }
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    reject_blank(&request)?;
    let context = state.service.retrieve(&request.question, request.top_k).await.map_err(api_error)?;
    Ok(Json(RetrieveResponse { context }))
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    reject_blank(&request)?;
    let result = state.service.answer(&request.question, request.top_k).await.map_err(api_error)?;
    Ok(Json(QueryResponse { answer: result.answer, context: result.context }))
}
