//! HTTP API tests
//!
//! Requests go straight into the router with `oneshot`; crawls that need a
//! live site use wiremock.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use site_harvester::api::build_router;
use site_harvester::config::Config;
use site_harvester::url::extract_domain;
use site_harvester::CrawlService;
use std::path::Path;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_service(root: &Path) -> CrawlService {
    let mut config = Config::default();
    config.output.root_dir = root.to_path_buf();
    CrawlService::new(config).expect("service builds")
}

async fn send(service: &CrawlService, request: Request<Body>) -> (StatusCode, axum::body::Bytes) {
    let response = build_router(service.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

async fn send_json(service: &CrawlService, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(service, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn scrape(body: Value) -> Request<Body> {
    Request::post("/scrape")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_scrape_rejects_invalid_url() {
    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let (status, body) = send_json(&service, scrape(serde_json::json!({ "url": "not a url" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(service.registry().is_empty());
}

#[tokio::test]
async fn test_scrape_then_poll_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<title>Home</title><p>hello</p>"),
        )
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let (status, body) = send_json(
        &service,
        scrape(serde_json::json!({
            "url": format!("{}/", mock_server.uri()),
            "use_js": false,
            "doc_types": ["pdf"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let job_id = body["job_id"].as_str().expect("job id is a string").to_string();
    let snapshot = service.wait(job_id.parse().unwrap()).await;
    assert!(snapshot.status.is_done());

    let (status, body) = send_json(&service, get(&format!("/status/{}", job_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "done");
    assert_eq!(body["progress"], 100);

    let url = url::Url::parse(&mock_server.uri()).unwrap();
    let domain = extract_domain(&url).unwrap();
    let (status, body) = send_json(&service, get(&format!("/results/{}", domain))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_job_status() {
    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let (status, body) = send_json(&service, get(&format!("/status/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_found");

    let (_, body) = send_json(&service, get("/status/not-a-uuid")).await;
    assert_eq!(body["status"], "not_found");
}

#[tokio::test]
async fn test_results_listing() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("output_site.test");
    std::fs::create_dir_all(dir.join("nested")).unwrap();
    std::fs::write(dir.join("b.txt"), "b").unwrap();
    std::fs::write(dir.join("a.txt"), "a").unwrap();
    let service = create_service(root.path());

    let (status, body) = send_json(&service, get("/results/site.test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "files": ["a.txt", "b.txt"] }));

    let (_, body) = send_json(&service, get("/results/never.crawled")).await;
    assert_eq!(body, serde_json::json!({ "files": [] }));
}

#[tokio::test]
async fn test_download_missing_file() {
    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let (status, body) = send_json(&service, get("/download/site.test/missing.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "error": "File not found" }));
}

#[tokio::test]
async fn test_download_existing_file() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("output_site.test");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("report.pdf"), b"%PDF-1.4").unwrap();
    let service = create_service(root.path());

    let response = build_router(service.clone())
        .oneshot(get("/download/site.test/report.pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.pdf\""
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"%PDF-1.4");
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("output_site.test")).unwrap();
    std::fs::write(root.path().join("secret.txt"), "secret").unwrap();
    let service = create_service(root.path());

    let (status, _) = send(&service, get("/download/site.test/..%2Fsecret.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
