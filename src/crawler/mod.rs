//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching, document downloads and rendered fetches
//! - Connection limiting shared across jobs
//! - Batched concurrent fetching
//! - The breadth-first frontier
//! - HTML parsing and link extraction
//! - Overall crawl coordination

mod batch;
mod coordinator;
mod fetcher;
mod frontier;
mod limiter;
mod parser;

pub use batch::FetchBatchExecutor;
pub use coordinator::{crawl_progress, Coordinator, CrawlJob, CrawlReport};
pub use fetcher::{
    build_http_client, Downloader, FetchResult, HttpFetcher, PageFetcher, Renderer, RenderingFetcher,
};
pub use frontier::Frontier;
pub use limiter::{ConnectionLimiter, ConnectionPermit};
pub use parser::{parse_html, ParsedPage};
