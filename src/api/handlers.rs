use crate::jobs::JobSnapshot;
use crate::service::CrawlService;
use crate::HarvestError;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

fn default_use_js() -> bool {
    true
}

/// Body of `POST /scrape`
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,

    /// Fetch pages through the service's renderer; without one the crawl
    /// falls back to plain HTTP
    #[serde(default = "default_use_js")]
    pub use_js: bool,

    /// Document extensions to collect; the configured defaults when absent
    #[serde(default)]
    pub doc_types: Option<Vec<String>>,
}

pub async fn scrape(State(service): State<CrawlService>, Json(request): Json<ScrapeRequest>) -> Response {
    let kinds = request
        .doc_types
        .unwrap_or_else(|| service.default_document_kinds().to_vec());

    match service.submit_crawl(&request.url, request.use_js, &kinds).await {
        Ok(job_id) => Json(json!({ "job_id": job_id })).into_response(),
        Err(HarvestError::UrlError(e)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to submit crawl of {}: {}", request.url, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn status(State(service): State<CrawlService>, Path(job_id): Path<String>) -> Response {
    let snapshot = match Uuid::parse_str(&job_id) {
        Ok(id) => service.poll_status(id),
        Err(_) => JobSnapshot::not_found(),
    };

    Json(json!({
        "status": snapshot.status,
        "progress": snapshot.progress,
    }))
    .into_response()
}

pub async fn results(State(service): State<CrawlService>, Path(domain): Path<String>) -> Response {
    let files = service.list_results(&domain).await;
    Json(json!({ "files": files })).into_response()
}

pub async fn download(
    State(service): State<CrawlService>,
    Path((domain, filename)): Path<(String, String)>,
) -> Response {
    match service.fetch_result(&domain, &filename).await {
        Some(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", header_safe(&filename));
            (
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found" })),
        )
            .into_response(),
    }
}

/// Replaces characters that cannot appear in a quoted header parameter
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect()
}
