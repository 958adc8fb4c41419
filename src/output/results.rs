use std::path::{Path, PathBuf};

/// Read access to the per-domain output directories under one root
///
/// Every crawl writes into `<root>/output_<domain>/`. Lookups take the
/// domain and filename from callers, so both are checked before they are
/// joined onto the root.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output directory of a domain
    pub fn domain_dir(&self, domain: &str) -> PathBuf {
        self.root.join(format!("output_{}", domain))
    }

    /// Creates the output directory of a domain
    pub async fn create_domain_dir(&self, domain: &str) -> std::io::Result<PathBuf> {
        let dir = self.domain_dir(domain);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Sorted filenames in a domain's output directory
    ///
    /// Returns an empty list when the directory does not exist (or the
    /// domain is not a plain name).
    pub async fn list_results(&self, domain: &str) -> Vec<String> {
        if !is_plain_component(domain) {
            return Vec::new();
        }

        let Ok(mut entries) = tokio::fs::read_dir(self.domain_dir(domain)).await else {
            return Vec::new();
        };

        let mut files = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_file = entry
                .file_type()
                .await
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if is_file {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        files.sort();
        files
    }

    /// Contents of one result file
    ///
    /// Returns None for missing files and for names that would resolve
    /// outside the domain directory.
    pub async fn fetch_result(&self, domain: &str, filename: &str) -> Option<Vec<u8>> {
        if !is_plain_component(domain) || !is_plain_component(filename) {
            tracing::debug!("Rejected result lookup {}/{}", domain, filename);
            return None;
        }

        tokio::fs::read(self.domain_dir(domain).join(filename)).await.ok()
    }
}

/// True if `name` is usable as a single path component
fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}
