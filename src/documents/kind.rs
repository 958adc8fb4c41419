use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Document formats the extractor registry knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Xls,
    Csv,
    Txt,
}

impl DocumentKind {
    /// Maps a (case-insensitive) file extension to a kind
    ///
    /// Returns None for extensions with no decoder, which the document
    /// pipeline downloads without extracting.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// The canonical lowercase extension for this kind
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Csv => "csv",
            Self::Txt => "txt",
        }
    }

    /// Returns all document kinds
    pub fn all() -> [Self; 7] {
        [
            Self::Pdf,
            Self::Docx,
            Self::Pptx,
            Self::Xlsx,
            Self::Xls,
            Self::Csv,
            Self::Txt,
        ]
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The set of document extensions a crawl routes to the document pipeline
///
/// Extensions are stored lowercase without a leading dot. Any extension may be
/// configured; those without a [`DocumentKind`] are downloaded but not
/// extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentKinds {
    extensions: BTreeSet<String>,
}

impl DocumentKinds {
    /// Builds the set from extension strings such as `"pdf"` or `".DOCX"`
    ///
    /// Empty entries and entries with characters other than ASCII
    /// alphanumerics and inner dots are skipped, so an extension can never
    /// alter the directory an artifact is written to.
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| is_plain_extension(ext))
            .collect();
        Self { extensions }
    }

    /// Returns the configured extension the path ends with, if any
    ///
    /// The comparison is case-insensitive and requires the extension to be
    /// preceded by a dot. When several extensions match (e.g. `tar.gz` and
    /// `gz`), the longest wins so the result does not depend on set order.
    pub fn match_path(&self, path: &str) -> Option<&str> {
        let path = path.to_ascii_lowercase();
        self.extensions
            .iter()
            .filter(|ext| {
                path.strip_suffix(ext.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
            })
            .max_by_key(|ext| ext.len())
            .map(String::as_str)
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

fn is_plain_extension(ext: &str) -> bool {
    !ext.is_empty()
        && !ext.ends_with('.')
        && !ext.contains("..")
        && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}
