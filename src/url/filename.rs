use sha2::{Digest, Sha256};

/// Longest human-readable prefix kept in an artifact name, in characters
const MAX_NAME_CHARS: usize = 150;

/// Number of hex digits of the URL hash appended to every artifact name
const HASH_CHARS: usize = 8;

/// Derives the artifact filename for a URL
///
/// The name is the URL without its scheme, with `/` replaced by `__`, cut to
/// 150 characters, followed by `_` and the first 8 hex digits of the SHA-256
/// of the full URL, and finally `.{extension}`. The same URL always maps to the
/// same name, so re-crawling overwrites earlier artifacts.
///
/// # Examples
///
/// ```
/// use site_harvester::url::artifact_filename;
///
/// let name = artifact_filename("https://site.test/about", "txt");
/// assert!(name.starts_with("site.test__about_"));
/// assert!(name.ends_with(".txt"));
/// ```
pub fn artifact_filename(url: &str, extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));

    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    let readable: String = without_scheme
        .replace('/', "__")
        .chars()
        .map(|c| if c == '\\' || c == '\0' { '_' } else { c })
        .take(MAX_NAME_CHARS)
        .collect();

    format!("{}_{}.{}", readable, &digest[..HASH_CHARS], extension)
}

/// Filename of the extracted-text companion of a raw document artifact
pub fn companion_filename(raw_filename: &str) -> String {
    format!("{}.txt", raw_filename)
}
