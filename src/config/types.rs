use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Site-Harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched per job
    pub max_pages: usize,

    /// Maximum number of pages fetched per batch
    pub max_concurrent: usize,

    /// Process-wide ceiling on simultaneous connections
    pub max_connections: usize,

    /// Ceiling on simultaneous connections to a single host
    pub max_connections_per_host: usize,

    /// Total timeout for a page fetch (seconds)
    pub request_timeout_secs: u64,

    /// Connect timeout for every request (seconds)
    pub connect_timeout_secs: u64,

    /// Total timeout for a document download (seconds)
    pub document_timeout_secs: u64,

    /// Size of the blocking pool used for document extraction
    pub extraction_workers: usize,

    /// Minimum time between requests to the same host (milliseconds, 0 disables)
    pub politeness_delay_ms: u64,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            max_concurrent: 50,
            max_connections: 50,
            max_connections_per_host: 20,
            request_timeout_secs: 15,
            connect_timeout_secs: 5,
            document_timeout_secs: 30,
            extraction_workers: 20,
            politeness_delay_ms: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteHarvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory under which one `output_<domain>` directory is created per crawled domain
    pub root_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Document handling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DocumentsConfig {
    /// Document kinds routed to the document pipeline when a request names none
    pub default_kinds: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            default_kinds: ["docx", "pdf", "csv", "xlsx", "pptx", "txt"]
                .iter()
                .map(|kind| kind.to_string())
                .collect(),
        }
    }
}
