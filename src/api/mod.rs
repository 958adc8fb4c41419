//! HTTP API
//!
//! Routes:
//! - `POST /scrape` starts a crawl and returns its job id
//! - `GET /status/:job_id` reports job status and progress
//! - `GET /results/:domain` lists a domain's result files
//! - `GET /download/:domain/:filename` returns one result file

pub mod handlers;

use crate::service::CrawlService;
use crate::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the API router around a service
pub fn build_router(service: CrawlService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/scrape", post(handlers::scrape))
        .route("/status/:job_id", get(handlers::status))
        .route("/results/:domain", get(handlers::results))
        .route("/download/:domain/:filename", get(handlers::download))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves the API on `bind` until the process is stopped
pub async fn serve(service: CrawlService, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(service)).await?;
    Ok(())
}
