use super::formats;
use super::kind::DocumentKind;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

/// A text extractor for one document format
pub type Extractor = Arc<dyn Fn(&[u8]) -> anyhow::Result<String> + Send + Sync>;

/// Maps each document kind to its text extractor
///
/// Extraction never fails from the caller's point of view: a missing
/// extractor, a decode error or a panic inside the extractor all produce an
/// empty string.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentKind, Extractor>,
}

impl ExtractorRegistry {
    /// Creates a registry without any extractors
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in extractor for every [`DocumentKind`]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .register(DocumentKind::Txt, formats::extract_txt)
            .register(DocumentKind::Csv, formats::extract_csv)
            .register(DocumentKind::Xlsx, formats::extract_spreadsheet)
            .register(DocumentKind::Xls, formats::extract_spreadsheet)
            .register(DocumentKind::Docx, formats::extract_docx)
            .register(DocumentKind::Pptx, formats::extract_pptx)
            .register(DocumentKind::Pdf, formats::extract_pdf);
        registry
    }

    /// Registers (or replaces) the extractor for a kind
    pub fn register<F>(&mut self, kind: DocumentKind, extractor: F) -> &mut Self
    where
        F: Fn(&[u8]) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.extractors.insert(kind, Arc::new(extractor));
        self
    }

    pub fn has_extractor(&self, kind: DocumentKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Extracts the text of the file at `path`
    ///
    /// Blocking; callers on the async runtime run this on a blocking thread.
    pub fn extract(&self, path: &Path, kind: DocumentKind) -> String {
        match std::fs::read(path) {
            Ok(bytes) => self.extract_bytes(&bytes, kind),
            Err(e) => {
                tracing::warn!("Failed to read {} for extraction: {}", path.display(), e);
                String::new()
            }
        }
    }

    /// Extracts text from an in-memory document
    pub fn extract_bytes(&self, bytes: &[u8], kind: DocumentKind) -> String {
        let Some(extractor) = self.extractors.get(&kind) else {
            return String::new();
        };

        match panic::catch_unwind(AssertUnwindSafe(|| extractor(bytes))) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!("Failed to extract {} document: {:#}", kind, e);
                String::new()
            }
            Err(_) => {
                tracing::warn!("The {} extractor panicked", kind);
                String::new()
            }
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.extractors.keys().collect();
        kinds.sort();
        f.debug_struct("ExtractorRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
