//! URL handling module for Site-Harvester
//!
//! This module provides domain extraction, deterministic artifact naming, and
//! the link classifier that decides what the crawler does with every
//! hyperlink it discovers.

mod domain;
mod filename;

use crate::documents::DocumentKinds;
use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use filename::{artifact_filename, companion_filename};

/// What the crawler does with a discovered link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// In-scope page - queue it for fetching
    Page,
    /// Document with the matched (lowercase) extension - hand it to the document pipeline
    Document(String),
    /// Out-of-scope or unsupported link - drop it
    Ignore,
}

impl LinkClass {
    /// Returns true if the link should be crawled as a page
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page)
    }

    /// Returns the document extension if the link is a document
    pub fn document_extension(&self) -> Option<&str> {
        match self {
            Self::Document(extension) => Some(extension),
            _ => None,
        }
    }
}

/// Classifies a discovered link
///
/// Classification is total and deterministic:
/// 1. If the path (query and fragment stripped, compared case-insensitively)
///    ends with `.{kind}` for one of `kinds` → `Document`, whatever its domain
/// 2. If the link is a relative reference, or its domain equals
///    `origin_domain` exactly (no subdomain matching) → `Page`
/// 3. Everything else, including non-HTTP(S) schemes → `Ignore`
///
/// # Arguments
///
/// * `link` - The link, normally already resolved against the page URL
/// * `origin_domain` - The crawl's domain, as produced by [`extract_domain`]
/// * `kinds` - The document kinds configured for the crawl
///
/// # Examples
///
/// ```
/// use site_harvester::documents::DocumentKinds;
/// use site_harvester::url::{classify_link, LinkClass};
///
/// let kinds = DocumentKinds::from_extensions(["pdf"]);
/// assert_eq!(
///     classify_link("https://site.test/files/Report.PDF?v=2", "site.test", &kinds),
///     LinkClass::Document("pdf".to_string())
/// );
/// assert_eq!(classify_link("https://site.test/about", "site.test", &kinds), LinkClass::Page);
/// assert_eq!(classify_link("https://blog.site.test/", "site.test", &kinds), LinkClass::Ignore);
/// ```
pub fn classify_link(link: &str, origin_domain: &str, kinds: &DocumentKinds) -> LinkClass {
    let (path, domain) = match Url::parse(link) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                return LinkClass::Ignore;
            }
            (url.path().to_string(), extract_domain(&url))
        }
        Err(::url::ParseError::RelativeUrlWithoutBase) => (strip_suffixes(link).to_string(), None),
        Err(_) => return LinkClass::Ignore,
    };

    if let Some(extension) = kinds.match_path(&path) {
        return LinkClass::Document(extension.to_string());
    }

    match domain {
        None => LinkClass::Page,
        Some(domain) if domain.eq_ignore_ascii_case(origin_domain) => LinkClass::Page,
        Some(_) => LinkClass::Ignore,
    }
}

/// Parses a crawl seed and returns it with its domain
///
/// A seed must be an absolute `http` or `https` URL with a host.
pub fn parse_seed(seed_url: &str) -> UrlResult<(Url, String)> {
    let url = Url::parse(seed_url.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", seed_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let domain = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
    Ok((url, domain))
}

/// Cuts the query string and fragment off a relative reference
fn strip_suffixes(link: &str) -> &str {
    let end = link.find(['?', '#']).unwrap_or(link.len());
    &link[..end]
}
