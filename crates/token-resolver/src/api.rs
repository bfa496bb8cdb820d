use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use crate::resolver::TokenResolver;
use crate::token::Token;
use crate::types::ResolverError;

/// Simple JSON schema returned from /health and error cases
#[derive(Serialize)]
struct HealthResp {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorResp {
    error: String,
}

struct ApiError(ResolverError);

impl From<ResolverError> for ApiError {
    fn from(e: ResolverError) -> Self {
        ApiError(e)
    }
}

pub fn status_for(err: &ResolverError) -> StatusCode {
    match err {
        ResolverError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        ResolverError::Chain(_) | ResolverError::Source(_) => StatusCode::BAD_GATEWAY,
        ResolverError::Store(_) | ResolverError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!("request failed: {}", self.0);
        }
        (status, Json(ErrorResp { error: self.0.to_string() })).into_response()
    }
}

async fn health() -> Json<HealthResp> {
    Json(HealthResp { status: "ok" })
}

async fn list_tokens(
    State(resolver): State<Arc<TokenResolver>>,
) -> Result<Json<Vec<Token>>, ApiError> {
    let tokens = resolver.store().list().await.map_err(ResolverError::from)?;
    Ok(Json(tokens))
}

async fn get_token(
    State(resolver): State<Arc<TokenResolver>>,
    Path(address): Path<String>,
) -> Result<Json<Option<Token>>, ApiError> {
    Ok(Json(resolver.find(Some(&address)).await?))
}

async fn refresh_token(
    State(resolver): State<Arc<TokenResolver>>,
    Path(address): Path<String>,
) -> Result<Json<Token>, ApiError> {
    Ok(Json(resolver.refresh(&address).await?))
}

pub fn router(resolver: Arc<TokenResolver>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tokens", get(list_tokens))
        .route("/tokens/:address", get(get_token))
        .route("/tokens/:address/refresh", post(refresh_token))
        .with_state(resolver)
}

pub struct ApiServer {
    resolver: Arc<TokenResolver>,
}

impl ApiServer {
    pub fn new(resolver: Arc<TokenResolver>) -> Self {
        Self { resolver }
    }

    pub async fn start(self, addr: &str) -> anyhow::Result<()> {
        let addr: std::net::SocketAddr = addr.parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Starting API server on {}", addr);
        axum::serve(listener, router(self.resolver)).await?;
        Ok(())
    }
}
