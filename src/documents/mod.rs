//! Linked-document handling
//!
//! This module provides:
//! - The closed set of decodable document kinds and the per-crawl extension set
//! - The extractor registry turning raw document bytes into plain text
//! - The pipeline that downloads documents and runs extraction off the crawl loop

mod formats;
mod kind;
mod pipeline;
mod registry;

pub use formats::{
    extract_csv, extract_docx, extract_pdf, extract_pptx, extract_spreadsheet, extract_txt,
};
pub use kind::{DocumentKind, DocumentKinds};
pub use pipeline::{DocumentOutcome, DocumentPipeline, DocumentTask};
pub use registry::{Extractor, ExtractorRegistry};
