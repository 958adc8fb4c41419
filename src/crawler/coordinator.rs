//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop of a single job:
//! - Managing the breadth-first frontier
//! - Fetching pages in bounded batches
//! - Saving page artifacts and classifying discovered links
//! - Handing documents to the document pipeline
//! - Reporting progress to the job registry

use super::batch::FetchBatchExecutor;
use super::fetcher::{FetchResult, PageFetcher};
use super::frontier::Frontier;
use super::parser::parse_html;
use crate::config::CrawlerConfig;
use crate::documents::{DocumentKinds, DocumentOutcome, DocumentPipeline};
use crate::jobs::{JobId, JobRegistry};
use crate::output::write_page_artifact;
use crate::url::{classify_link, extract_domain, LinkClass};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Progress never reported before the job is complete
const MAX_RUNNING_PROGRESS: u8 = 95;

/// Everything one crawl needs to know
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub job_id: JobId,
    pub seed_url: String,
    pub use_rendering: bool,
    pub document_kinds: DocumentKinds,
    pub output_dir: PathBuf,
}

/// Counters describing a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    /// URLs selected for fetching
    pub pages_visited: usize,

    /// Pages fetched and written to disk
    pub pages_saved: usize,

    /// Pages whose fetch failed
    pub pages_failed: usize,

    /// Distinct document URLs handed to the pipeline
    pub documents_scheduled: usize,

    /// Documents downloaded successfully
    pub documents_downloaded: usize,

    /// Documents with a companion text file
    pub documents_extracted: usize,
}

/// Job progress after `visited` pages out of a `max_pages` budget
///
/// Rounded to the nearest percent and capped at 95 so that 100 is only
/// reported by the registry once the job is done.
pub fn crawl_progress(visited: usize, max_pages: usize) -> u8 {
    if max_pages == 0 {
        return MAX_RUNNING_PROGRESS;
    }
    let percent = (visited.saturating_mul(100) + max_pages / 2) / max_pages;
    percent.min(MAX_RUNNING_PROGRESS as usize) as u8
}

/// Main crawler coordinator structure
///
/// A coordinator is shared by all jobs of a service; each call to
/// [`Coordinator::run`] owns its own frontier.
#[derive(Clone)]
pub struct Coordinator {
    http: Arc<dyn PageFetcher>,
    renderer: Option<Arc<dyn PageFetcher>>,
    documents: DocumentPipeline,
    registry: JobRegistry,
    max_pages: usize,
    max_concurrent: usize,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl limits
    /// * `http` - Fetcher used for pages
    /// * `documents` - Pipeline receiving discovered documents
    /// * `registry` - Registry receiving progress updates
    pub fn new(
        config: &CrawlerConfig,
        http: Arc<dyn PageFetcher>,
        documents: DocumentPipeline,
        registry: JobRegistry,
    ) -> Self {
        Self {
            http,
            renderer: None,
            documents,
            registry,
            max_pages: config.max_pages,
            max_concurrent: config.max_concurrent.max(1),
        }
    }

    /// Sets the fetcher used by jobs that request JavaScript rendering
    pub fn with_renderer(mut self, renderer: Arc<dyn PageFetcher>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Runs the crawl loop of one job
    ///
    /// Individual failures (fetch errors, unwritable artifacts, failed
    /// documents) are logged and skipped. The loop ends when the frontier is
    /// exhausted or the page budget is used up, then waits for every
    /// scheduled document before returning. Completing the job in the
    /// registry is left to the caller.
    pub async fn run(&self, job: CrawlJob) -> CrawlReport {
        let mut report = CrawlReport::default();

        let Some(base_domain) = Url::parse(&job.seed_url)
            .ok()
            .and_then(|seed| extract_domain(&seed))
        else {
            tracing::warn!("Job {}: seed {} has no domain", job.job_id, job.seed_url);
            return report;
        };

        tracing::info!(
            "Job {}: crawling {} (domain {}, rendering {})",
            job.job_id,
            job.seed_url,
            base_domain,
            job.use_rendering
        );

        if let Err(e) = tokio::fs::create_dir_all(&job.output_dir).await {
            tracing::warn!(
                "Job {}: cannot create {}: {}",
                job.job_id,
                job.output_dir.display(),
                e
            );
        }

        let executor = FetchBatchExecutor::new(self.page_fetcher(&job));
        let mut frontier = Frontier::new(&job.seed_url);
        let mut scheduled_documents = HashSet::new();
        let mut documents = JoinSet::new();

        while !frontier.is_empty() && frontier.visited_count() < self.max_pages {
            let room = self.max_pages - frontier.visited_count();
            let batch = frontier.next_batch(self.max_concurrent.min(room));
            if batch.is_empty() {
                break;
            }

            tracing::debug!("Job {}: fetching batch of {}", job.job_id, batch.len());
            let results = executor.fetch_batch(&batch).await;

            for result in results {
                let (url, body) = match result {
                    FetchResult::Success { url, body } => (url, body),
                    failed => {
                        tracing::debug!("Job {}: skipping {:?}", job.job_id, failed);
                        report.pages_failed += 1;
                        continue;
                    }
                };

                let Ok(page_url) = Url::parse(&url) else {
                    report.pages_failed += 1;
                    continue;
                };
                let page = parse_html(&body, &page_url);

                match write_page_artifact(&job.output_dir, &url, page.title.as_deref(), &page.text)
                    .await
                {
                    Ok(_) => report.pages_saved += 1,
                    Err(e) => tracing::warn!("Job {}: failed to save {}: {}", job.job_id, url, e),
                }

                for link in page.links {
                    match classify_link(&link, &base_domain, &job.document_kinds) {
                        LinkClass::Document(extension) => {
                            if !scheduled_documents.insert(link.clone()) {
                                continue;
                            }
                            report.documents_scheduled += 1;

                            let pipeline = self.documents.clone();
                            let output_dir = job.output_dir.clone();
                            documents.spawn(async move {
                                let outcome = pipeline.handle(&link, &extension, &output_dir).await;
                                (link, outcome)
                            });
                        }
                        LinkClass::Page => {
                            frontier.enqueue(&link);
                        }
                        LinkClass::Ignore => {}
                    }
                }
            }

            self.registry.update(
                job.job_id,
                crawl_progress(frontier.visited_count(), self.max_pages),
            );
        }

        report.pages_visited = frontier.visited_count();
        tracing::info!(
            "Job {}: {} pages visited, waiting for {} documents",
            job.job_id,
            report.pages_visited,
            documents.len()
        );

        while let Some(joined) = documents.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => record_document(&mut report, &outcome),
                Ok((url, Err(e))) => {
                    tracing::warn!("Job {}: document {} failed: {}", job.job_id, url, e)
                }
                Err(e) => tracing::warn!("Job {}: document task died: {}", job.job_id, e),
            }
        }

        tracing::info!("Job {}: crawl finished {:?}", job.job_id, report);
        report
    }

    fn page_fetcher(&self, job: &CrawlJob) -> Arc<dyn PageFetcher> {
        if !job.use_rendering {
            return Arc::clone(&self.http);
        }
        match &self.renderer {
            Some(renderer) => Arc::clone(renderer),
            None => {
                tracing::warn!(
                    "Job {}: rendering requested but no renderer is configured, using plain HTTP",
                    job.job_id
                );
                Arc::clone(&self.http)
            }
        }
    }
}

fn record_document(report: &mut CrawlReport, outcome: &DocumentOutcome) {
    report.documents_downloaded += 1;
    if outcome.text_path.is_some() {
        report.documents_extracted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Downloader;
    use crate::documents::ExtractorRegistry;
    use crate::jobs::JobStatus;
    use crate::{HarvestError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory site that records every fetch
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeSite {
        fn with_pages(pages: Vec<(String, String)>) -> Arc<Self> {
            Arc::new(Self {
                pages: pages.into_iter().collect(),
                ..Self::default()
            })
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str) -> FetchResult {
            self.fetched.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.pages.get(url) {
                Some(body) => FetchResult::Success {
                    url: url.to_string(),
                    body: body.clone(),
                },
                None => FetchResult::HttpError {
                    url: url.to_string(),
                    status_code: 404,
                },
            }
        }
    }

    #[derive(Default)]
    struct CountingDownloader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Downloader for CountingDownloader {
        async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("missing") {
                return Err(HarvestError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            tokio::fs::write(dest, b"document body").await?;
            Ok(13)
        }
    }

    fn page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!("<a href=\"{}\">link</a>", href))
            .collect();
        format!("<html><head><title>Page</title></head><body>{}</body></html>", anchors)
    }

    fn config(max_pages: usize, max_concurrent: usize) -> CrawlerConfig {
        CrawlerConfig {
            max_pages,
            max_concurrent,
            ..CrawlerConfig::default()
        }
    }

    struct Harness {
        coordinator: Coordinator,
        registry: JobRegistry,
        downloader: Arc<CountingDownloader>,
        output: tempfile::TempDir,
    }

    fn harness(site: Arc<FakeSite>, config: CrawlerConfig) -> Harness {
        let registry = JobRegistry::new();
        let downloader = Arc::new(CountingDownloader::default());
        let pipeline = DocumentPipeline::new(
            downloader.clone(),
            Arc::new(ExtractorRegistry::with_defaults()),
            4,
        );
        Harness {
            coordinator: Coordinator::new(&config, site, pipeline, registry.clone()),
            registry,
            downloader,
            output: tempfile::tempdir().unwrap(),
        }
    }

    impl Harness {
        async fn crawl(&self, seed: &str, kinds: &[&str]) -> (JobId, CrawlReport) {
            let job_id = self.registry.create("site.test");
            let job = CrawlJob {
                job_id,
                seed_url: seed.to_string(),
                use_rendering: false,
                document_kinds: DocumentKinds::from_extensions(kinds),
                output_dir: self.output.path().to_path_buf(),
            };
            (job_id, self.coordinator.run(job).await)
        }

        fn artifacts(&self) -> usize {
            std::fs::read_dir(self.output.path()).unwrap().count()
        }
    }

    #[test]
    fn test_crawl_progress() {
        assert_eq!(crawl_progress(0, 500), 0);
        assert_eq!(crawl_progress(50, 500), 10);
        assert_eq!(crawl_progress(3, 500), 1);
        assert_eq!(crawl_progress(2, 500), 0);
        assert_eq!(crawl_progress(490, 500), 95);
        assert_eq!(crawl_progress(500, 500), 95);
        assert_eq!(crawl_progress(1, 0), 95);
    }

    #[tokio::test]
    async fn test_two_page_cycle_fetches_each_once() {
        let site = FakeSite::with_pages(vec![
            ("https://site.test/".to_string(), page(&["/b"])),
            ("https://site.test/b".to_string(), page(&["/"])),
        ]);
        let harness = harness(site.clone(), config(500, 50));

        let (_, report) = harness.crawl("https://site.test/", &[]).await;

        assert_eq!(site.fetched().len(), 2);
        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.pages_saved, 2);
        assert_eq!(harness.artifacts(), 2);
    }

    #[tokio::test]
    async fn test_mesh_respects_concurrency_and_fetches_once() {
        let urls: Vec<String> = (0..200).map(|i| format!("https://site.test/p{}", i)).collect();
        let hrefs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let body = page(&hrefs);
        let mut pages: Vec<(String, String)> = urls.iter().map(|u| (u.clone(), body.clone())).collect();
        pages.push(("https://site.test/".to_string(), body.clone()));

        let site = FakeSite::with_pages(pages);
        let harness = harness(site.clone(), config(500, 50));

        let (_, report) = harness.crawl("https://site.test/", &[]).await;

        let fetched = site.fetched();
        let distinct: HashSet<_> = fetched.iter().collect();
        assert_eq!(fetched.len(), 201);
        assert_eq!(distinct.len(), fetched.len());
        assert!(site.peak.load(Ordering::SeqCst) <= 50);
        assert_eq!(report.pages_visited, 201);
    }

    #[tokio::test]
    async fn test_page_budget_is_respected() {
        let urls: Vec<String> = (0..100).map(|i| format!("https://site.test/p{}", i)).collect();
        let hrefs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let body = page(&hrefs);
        let mut pages: Vec<(String, String)> = urls.iter().map(|u| (u.clone(), body.clone())).collect();
        pages.push(("https://site.test/".to_string(), body.clone()));

        let site = FakeSite::with_pages(pages);
        let harness = harness(site.clone(), config(30, 8));

        let (job_id, report) = harness.crawl("https://site.test/", &[]).await;

        assert_eq!(site.fetched().len(), 30);
        assert_eq!(report.pages_visited, 30);
        assert_eq!(harness.registry.status(job_id), (JobStatus::Running, 95));
    }

    #[tokio::test]
    async fn test_document_linked_three_times_is_downloaded_once() {
        let site = FakeSite::with_pages(vec![
            ("https://site.test/".to_string(), page(&["/a", "/b", "/files/report.pdf"])),
            ("https://site.test/a".to_string(), page(&["/files/report.pdf"])),
            ("https://site.test/b".to_string(), page(&["/files/report.pdf"])),
        ]);
        let harness = harness(site, config(500, 50));

        let (_, report) = harness.crawl("https://site.test/", &["pdf"]).await;

        assert_eq!(harness.downloader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.documents_scheduled, 1);
        assert_eq!(report.documents_downloaded, 1);
        // 3 page artifacts plus the raw pdf; garbage pdf yields no companion
        assert_eq!(harness.artifacts(), 4);
    }

    #[tokio::test]
    async fn test_cross_domain_documents_are_fetched_pages_are_not() {
        let site = FakeSite::with_pages(vec![(
            "https://site.test/".to_string(),
            page(&["https://cdn.other.test/notes.txt", "https://other.test/page"]),
        )]);
        let harness = harness(site.clone(), config(500, 50));

        let (_, report) = harness.crawl("https://site.test/", &["txt"]).await;

        assert_eq!(site.fetched(), vec!["https://site.test/".to_string()]);
        assert_eq!(report.documents_downloaded, 1);
        assert_eq!(report.documents_extracted, 1);
    }

    #[tokio::test]
    async fn test_failed_document_does_not_stop_crawl() {
        let site = FakeSite::with_pages(vec![
            ("https://site.test/".to_string(), page(&["/missing.pdf", "/next"])),
            ("https://site.test/next".to_string(), page(&[])),
        ]);
        let harness = harness(site, config(500, 50));

        let (_, report) = harness.crawl("https://site.test/", &["pdf"]).await;

        assert_eq!(report.pages_saved, 2);
        assert_eq!(report.documents_scheduled, 1);
        assert_eq!(report.documents_downloaded, 0);
    }

    #[tokio::test]
    async fn test_failing_seed_yields_empty_crawl() {
        let site = FakeSite::with_pages(vec![]);
        let harness = harness(site.clone(), config(500, 50));

        let (_, report) = harness.crawl("https://site.test/", &["pdf"]).await;

        assert_eq!(site.fetched().len(), 1);
        assert_eq!(report.pages_visited, 1);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.pages_saved, 0);
        assert_eq!(harness.artifacts(), 0);
    }

    #[tokio::test]
    async fn test_progress_is_reported_per_batch() {
        let site = FakeSite::with_pages(vec![
            ("https://site.test/".to_string(), page(&["/a"])),
            ("https://site.test/a".to_string(), page(&[])),
        ]);
        let harness = harness(site, config(4, 50));

        let (job_id, _) = harness.crawl("https://site.test/", &[]).await;

        // 2 of 4 pages visited
        assert_eq!(harness.registry.status(job_id), (JobStatus::Running, 50));
    }

    #[tokio::test]
    async fn test_rendering_without_renderer_falls_back_to_http() {
        let site = FakeSite::with_pages(vec![("https://site.test/".to_string(), page(&[]))]);
        let harness = harness(site.clone(), config(500, 50));
        assert!(!harness.coordinator.has_renderer());

        let job = CrawlJob {
            job_id: harness.registry.create("site.test"),
            seed_url: "https://site.test/".to_string(),
            use_rendering: true,
            document_kinds: DocumentKinds::default(),
            output_dir: harness.output.path().to_path_buf(),
        };
        let report = harness.coordinator.run(job).await;

        assert_eq!(report.pages_saved, 1);
        assert_eq!(site.fetched().len(), 1);
    }

    #[tokio::test]
    async fn test_rendering_uses_renderer_when_configured() {
        let http = FakeSite::with_pages(vec![]);
        let rendered = FakeSite::with_pages(vec![("https://site.test/".to_string(), page(&[]))]);
        let mut harness = harness(http.clone(), config(500, 50));
        harness.coordinator = harness.coordinator.clone().with_renderer(rendered.clone());

        let job = CrawlJob {
            job_id: harness.registry.create("site.test"),
            seed_url: "https://site.test/".to_string(),
            use_rendering: true,
            document_kinds: DocumentKinds::default(),
            output_dir: harness.output.path().to_path_buf(),
        };
        let report = harness.coordinator.run(job).await;

        assert_eq!(report.pages_saved, 1);
        assert!(http.fetched().is_empty());
        assert_eq!(rendered.fetched().len(), 1);
    }
}
