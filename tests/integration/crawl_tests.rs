//! End-to-end crawl tests
//!
//! These tests use wiremock to stand up a small site and run whole crawls
//! through the service, checking what lands in the output directory.

use site_harvester::config::Config;
use site_harvester::url::{artifact_filename, companion_filename, extract_domain};
use site_harvester::{CrawlService, JobStatus};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_service(root: &Path) -> CrawlService {
    let mut config = Config::default();
    config.output.root_dir = root.to_path_buf();
    CrawlService::new(config).expect("service builds")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body)
}

/// A one-page PDF whose text layer holds `text`
fn pdf_with_text(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    out
}

fn domain_of(server: &MockServer) -> String {
    let url = url::Url::parse(&server.uri()).expect("mock server uri");
    extract_domain(&url).expect("mock server has a host")
}

#[tokio::test]
async fn test_full_crawl_saves_pages_and_documents() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Home</title></head><body>
                <p>Welcome home</p>
                <a href="/about">About</a>
                <a href="/files/doc.pdf">Report</a>
                <a href="/notes.txt">Notes</a>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<html><head><title>About</title></head><body><p>About us</p><a href="/">Home</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_with_text("Hello PDF")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain notes"))
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());
    let domain = domain_of(&mock_server);

    let job_id = service
        .submit_crawl(&format!("{}/", base), false, ["pdf", "txt"])
        .await
        .unwrap();
    let snapshot = service.wait(job_id).await;

    assert_eq!(snapshot.status, JobStatus::Done);
    assert_eq!(snapshot.progress, 100);
    assert_eq!(snapshot.error, None);

    let home = artifact_filename(&format!("{}/", base), "txt");
    let about = artifact_filename(&format!("{}/about", base), "txt");
    let pdf = artifact_filename(&format!("{}/files/doc.pdf", base), "pdf");
    let notes = artifact_filename(&format!("{}/notes.txt", base), "txt");

    let files = service.list_results(&domain).await;
    assert!(files.contains(&home), "missing {} in {:?}", home, files);
    assert!(files.contains(&about));
    assert!(files.contains(&pdf));
    assert!(files.contains(&notes));
    assert!(files.contains(&companion_filename(&notes)));
    assert!(files.contains(&companion_filename(&pdf)), "missing pdf text in {:?}", files);
    assert_eq!(files.len(), 6);

    let home_text = String::from_utf8(service.fetch_result(&domain, &home).await.unwrap()).unwrap();
    assert!(home_text.starts_with(&format!("URL: {}/\nTitle: Home\n\n", base)));
    assert!(home_text.contains("Welcome home"));

    let notes_text = service
        .fetch_result(&domain, &companion_filename(&notes))
        .await
        .unwrap();
    assert_eq!(notes_text, b"plain notes");

    let pdf_text = service
        .fetch_result(&domain, &companion_filename(&pdf))
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&pdf_text).contains("Hello PDF"));
}

#[tokio::test]
async fn test_unreadable_document_keeps_raw_artifact_only() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/broken.docx">Broken</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken.docx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not a zip container"))
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let job_id = service
        .submit_crawl(&format!("{}/", base), false, ["docx"])
        .await
        .unwrap();
    service.wait(job_id).await;

    let raw = artifact_filename(&format!("{}/broken.docx", base), "docx");
    let files = service.list_results(&domain_of(&mock_server)).await;
    assert!(files.contains(&raw));
    assert!(!files.contains(&companion_filename(&raw)));
    assert_eq!(files.len(), 2);
}

#[tokio::test]
async fn test_failing_seed_finishes_with_no_files() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let job_id = service
        .submit_crawl(&format!("{}/", mock_server.uri()), false, ["pdf"])
        .await
        .unwrap();
    let snapshot = service.wait(job_id).await;

    assert_eq!(snapshot.status, JobStatus::Done);
    assert_eq!(snapshot.progress, 100);
    assert!(service.list_results(&domain_of(&mock_server)).await.is_empty());
}

#[tokio::test]
async fn test_shared_document_downloaded_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/a">A</a><a href="/b">B</a><a href="/shared.pdf">Doc</a>"#,
        ))
        .mount(&mock_server)
        .await;

    for page in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(r#"<a href="/shared.pdf">Doc</a>"#))
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/shared.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let job_id = service
        .submit_crawl(&format!("{}/", mock_server.uri()), false, ["pdf"])
        .await
        .unwrap();
    service.wait(job_id).await;

    mock_server.verify().await;
}

#[tokio::test]
async fn test_cycle_fetches_each_page_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/other">Other</a><a href="/">Self</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html(r#"<a href="/">Back</a><a href="/other">Self</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let job_id = service
        .submit_crawl(&format!("{}/", mock_server.uri()), false, Vec::<String>::new())
        .await
        .unwrap();
    let snapshot = service.wait(job_id).await;

    assert_eq!(snapshot.status, JobStatus::Done);
    assert_eq!(service.list_results(&domain_of(&mock_server)).await.len(), 2);
    mock_server.verify().await;
}

#[tokio::test]
async fn test_external_pages_are_not_followed() {
    let site = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(r#"<a href="{}/page">Away</a>"#, elsewhere.uri())))
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("<p>elsewhere</p>"))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let root = tempfile::tempdir().unwrap();
    let service = create_service(root.path());

    let job_id = service
        .submit_crawl(&format!("{}/", site.uri()), false, ["pdf"])
        .await
        .unwrap();
    service.wait(job_id).await;

    assert_eq!(service.list_results(&domain_of(&site)).await.len(), 1);
    elsewhere.verify().await;
}
