use url::Url;

/// Extracts the crawl-scope domain from a URL
///
/// This is the lowercase host, followed by `:port` when the URL names a port
/// other than the scheme's default. Two URLs are "in the same domain" only if
/// these strings are equal; subdomains are distinct domains.
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain (with explicit port, if any)
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvester::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
