//! The service surface used by the HTTP API and the CLI
//!
//! A [`CrawlService`] owns the job registry, the crawl coordinator and the
//! result store. Submitting a crawl returns at once; the crawl itself runs
//! as a supervised background task.

use crate::config::Config;
use crate::crawler::{ConnectionLimiter, Coordinator, CrawlJob, HttpFetcher, Renderer, RenderingFetcher};
use crate::documents::{DocumentKinds, DocumentPipeline, ExtractorRegistry};
use crate::jobs::{JobId, JobRegistry, JobSnapshot};
use crate::output::ResultStore;
use crate::url::parse_seed;
use crate::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct CrawlService {
    config: Arc<Config>,
    registry: JobRegistry,
    coordinator: Coordinator,
    limiter: Arc<ConnectionLimiter>,
    results: ResultStore,
}

impl CrawlService {
    /// Builds a service with the built-in extractors
    pub fn new(config: Config) -> Result<Self> {
        Self::with_extractors(config, ExtractorRegistry::with_defaults())
    }

    /// Builds a service with a custom extractor registry
    pub fn with_extractors(config: Config, extractors: ExtractorRegistry) -> Result<Self> {
        let limiter = Arc::new(ConnectionLimiter::from_config(&config.crawler));
        let http = Arc::new(HttpFetcher::from_config(&config, Arc::clone(&limiter))?);
        let pipeline = DocumentPipeline::new(
            http.clone(),
            Arc::new(extractors),
            config.crawler.extraction_workers,
        );

        let registry = JobRegistry::new();
        let coordinator = Coordinator::new(&config.crawler, http, pipeline, registry.clone());

        Ok(Self {
            results: ResultStore::new(config.output.root_dir.clone()),
            config: Arc::new(config),
            registry,
            coordinator,
            limiter,
        })
    }

    /// Routes page fetches of rendering jobs through `renderer`
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        let fetcher = RenderingFetcher::new(
            renderer,
            Arc::clone(&self.limiter),
            self.config.crawler.request_timeout(),
        );
        self.coordinator = self.coordinator.with_renderer(Arc::new(fetcher));
        self
    }

    /// True once a renderer has been injected with [`with_renderer`](Self::with_renderer)
    pub fn has_renderer(&self) -> bool {
        self.coordinator.has_renderer()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// The document extensions used when a request names none
    pub fn default_document_kinds(&self) -> &[String] {
        &self.config.documents.default_kinds
    }

    /// Starts a crawl in the background and returns its job id
    ///
    /// # Errors
    ///
    /// Fails if the seed is not an absolute http(s) URL with a host, or if
    /// the domain's output directory cannot be created. Nothing is started
    /// in either case.
    pub async fn submit_crawl<I, S>(&self, seed_url: &str, use_rendering: bool, document_kinds: I) -> Result<JobId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (seed, domain) = parse_seed(seed_url)?;
        let output_dir = self.results.create_domain_dir(&domain).await?;

        let job_id = self.registry.create(&domain);
        let job = CrawlJob {
            job_id,
            seed_url: seed.to_string(),
            use_rendering,
            document_kinds: DocumentKinds::from_extensions(document_kinds),
            output_dir,
        };

        let coordinator = self.coordinator.clone();
        self.registry.spawn(job_id, async move {
            let report = coordinator.run(job).await;
            tracing::debug!("Job {} report: {:?}", job_id, report);
        });

        tracing::info!("Submitted job {} for {}", job_id, seed);
        Ok(job_id)
    }

    /// Current status of a job; unknown ids report `not_found`
    pub fn poll_status(&self, job_id: JobId) -> JobSnapshot {
        self.registry.get(job_id)
    }

    /// Waits for a job to finish
    pub async fn wait(&self, job_id: JobId) -> JobSnapshot {
        self.registry.wait(job_id).await
    }

    /// Sorted result filenames of a domain
    pub async fn list_results(&self, domain: &str) -> Vec<String> {
        self.results.list_results(domain).await
    }

    /// Contents of one result file of a domain
    pub async fn fetch_result(&self, domain: &str, filename: &str) -> Option<Vec<u8>> {
        self.results.fetch_result(domain, filename).await
    }
}
