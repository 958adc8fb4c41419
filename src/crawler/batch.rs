use super::fetcher::{FetchResult, PageFetcher};
use futures::future::join_all;
use std::sync::Arc;

/// Fetches one frontier batch concurrently
///
/// Results come back in the order the URLs were given. Individual failures
/// are reported as [`FetchResult`] markers; a batch never fails as a whole.
#[derive(Clone)]
pub struct FetchBatchExecutor {
    fetcher: Arc<dyn PageFetcher>,
}

impl FetchBatchExecutor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn fetch_batch(&self, urls: &[String]) -> Vec<FetchResult> {
        join_all(urls.iter().map(|url| self.fetcher.fetch(url))).await
    }
}
