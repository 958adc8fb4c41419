//! Output module for crawl artifacts
//!
//! This module handles:
//! - Writing page artifacts into a crawl's output directory
//! - Listing and reading the result files of a domain

mod artifacts;
mod results;

pub use artifacts::{format_page_artifact, write_page_artifact};
pub use results::ResultStore;
