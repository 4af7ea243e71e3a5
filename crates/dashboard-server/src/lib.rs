//! Dashboard Server
//!
//! Read-only JSON API over the CSV tables written by the pipeline engine.
//! Every request reloads the tables, so a fresh pipeline run shows up without
//! a restart.

pub mod routes;
pub mod views;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use output_store::OutputStore;
use serde::Serialize;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub store: OutputStore,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Handler error: any error plus the status to answer with (500 by default).
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        }
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(format!("{:#}", self.error)),
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::dashboard_routes()
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

pub async fn run_server(addr: SocketAddr, store: OutputStore) -> anyhow::Result<()> {
    tracing::info!("Serving tables from {}", store.dir().display());
    let app = build_router(AppState { store });

    tracing::info!("Starting dashboard on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
