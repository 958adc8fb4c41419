//! Document download and extraction
//!
//! Documents are handed over by the coordinator as soon as they are
//! discovered. Each one is downloaded to its artifact path, then decoded on
//! the blocking thread pool behind a semaphore so that extraction never
//! stalls the crawl loop.

use super::kind::DocumentKind;
use super::registry::ExtractorRegistry;
use crate::crawler::Downloader;
use crate::url::{artifact_filename, companion_filename};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A document scheduled for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTask {
    /// Source URL
    pub url: String,

    /// Matched extension, lowercase
    pub extension: String,

    /// Decoder kind, if the extension has one
    pub kind: Option<DocumentKind>,

    /// Where the raw bytes are written
    pub raw_path: PathBuf,
}

impl DocumentTask {
    pub fn new(url: &str, extension: &str, output_dir: &Path) -> Self {
        Self {
            url: url.to_string(),
            extension: extension.to_string(),
            kind: DocumentKind::from_extension(extension),
            raw_path: output_dir.join(artifact_filename(url, extension)),
        }
    }

    /// Path of the extracted-text companion file
    pub fn text_path(&self) -> PathBuf {
        let raw_name = self
            .raw_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.raw_path.with_file_name(companion_filename(&raw_name))
    }
}

/// What a finished document task left on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub raw_path: PathBuf,
    pub bytes: u64,

    /// Set only when extraction produced text
    pub text_path: Option<PathBuf>,
}

/// Downloads documents and extracts their text
#[derive(Clone)]
pub struct DocumentPipeline {
    downloader: Arc<dyn Downloader>,
    extractors: Arc<ExtractorRegistry>,
    workers: Arc<Semaphore>,
}

impl DocumentPipeline {
    /// Creates a pipeline running at most `extraction_workers` extractions at once
    pub fn new(
        downloader: Arc<dyn Downloader>,
        extractors: Arc<ExtractorRegistry>,
        extraction_workers: usize,
    ) -> Self {
        Self {
            downloader,
            extractors,
            workers: Arc::new(Semaphore::new(extraction_workers.max(1))),
        }
    }

    /// Downloads `url` into `output_dir` and extracts its text
    ///
    /// Returns an error only when the download fails; extraction failures
    /// leave the raw artifact in place without a companion text file.
    pub async fn handle(&self, url: &str, extension: &str, output_dir: &Path) -> Result<DocumentOutcome> {
        self.process(DocumentTask::new(url, extension, output_dir)).await
    }

    pub async fn process(&self, task: DocumentTask) -> Result<DocumentOutcome> {
        let bytes = self.downloader.download(&task.url, &task.raw_path).await?;
        tracing::debug!("Downloaded {} ({} bytes)", task.url, bytes);

        let mut outcome = DocumentOutcome {
            raw_path: task.raw_path.clone(),
            bytes,
            text_path: None,
        };

        let kind = match task.kind {
            Some(kind) if self.extractors.has_extractor(kind) => kind,
            _ => {
                tracing::debug!("No extractor for .{} document {}", task.extension, task.url);
                return Ok(outcome);
            }
        };

        let text = self.extract(task.raw_path.clone(), kind).await?;
        if text.is_empty() {
            tracing::debug!("No text extracted from {}", task.url);
            return Ok(outcome);
        }

        let text_path = task.text_path();
        tokio::fs::write(&text_path, text).await?;
        outcome.text_path = Some(text_path);

        Ok(outcome)
    }

    /// Number of extraction slots currently free
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }

    async fn extract(&self, path: PathBuf, kind: DocumentKind) -> Result<String> {
        let Ok(_permit) = self.workers.acquire().await else {
            return Ok(String::new());
        };

        let extractors = Arc::clone(&self.extractors);
        let text = tokio::task::spawn_blocking(move || extractors.extract(&path, kind)).await?;
        Ok(text)
    }
}
