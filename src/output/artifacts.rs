//! Page artifact generation
//!
//! Each successfully fetched page is saved as a text file holding its URL,
//! its title and its readable text.

use crate::url::artifact_filename;
use std::path::{Path, PathBuf};

/// Formats the contents of a page artifact
///
/// # Example
///
/// ```
/// use site_harvester::output::format_page_artifact;
///
/// let text = format_page_artifact("https://site.test/", Some("Home"), "Welcome");
/// assert_eq!(text, "URL: https://site.test/\nTitle: Home\n\nWelcome");
/// ```
pub fn format_page_artifact(url: &str, title: Option<&str>, body: &str) -> String {
    format!("URL: {}\nTitle: {}\n\n{}", url, title.unwrap_or(""), body)
}

/// Writes a page artifact into `output_dir`, overwriting any earlier copy
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written artifact
/// * `Err(std::io::Error)` - The file could not be written
pub async fn write_page_artifact(
    output_dir: &Path,
    url: &str,
    title: Option<&str>,
    body: &str,
) -> std::io::Result<PathBuf> {
    let path = output_dir.join(artifact_filename(url, "txt"));
    tokio::fs::write(&path, format_page_artifact(url, title, body)).await?;
    Ok(path)
}
