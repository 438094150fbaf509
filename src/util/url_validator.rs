use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// Plain HTTP to a non-loopback host would expose the bearer token.
    #[error("Insecure API URL: HTTPS required (plain HTTP is allowed for localhost only)")]
    Insecure,
    /// The URL points to a private or loopback address.
    #[error("Private address not allowed: {0}")]
    PrivateAddress(String),
}

/// Validates the backend base URL (e.g. `https://news.example.com/api/v1`).
///
/// HTTPS is required unless the host is loopback, so a local development
/// backend on `http://localhost:8000` still works. The trailing slash is
/// stripped so paths can be appended with `/`.
///
/// ```
/// use ainews::util::validate_api_base;
///
/// assert!(validate_api_base("https://news.example.com/api/v1").is_ok());
/// assert!(validate_api_base("http://localhost:8000/api/v1").is_ok());
/// assert!(validate_api_base("http://news.example.com/api/v1").is_err());
/// ```
pub fn validate_api_base(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "https" => {}
        "http" => {
            if !is_loopback_host(&url) {
                tracing::error!(base_url = %url, "Rejecting non-HTTPS API base URL");
                return Err(UrlValidationError::Insecure);
            }
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Validates an article URL before handing it to the system browser.
///
/// Article URLs are crawled from the web, so only public http(s) targets are
/// opened.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if is_loopback_host(&url) {
        return Err(UrlValidationError::PrivateAddress(
            url.host_str().unwrap_or_default().to_string(),
        ));
    }
    if let Some(ip) = host_ip(&url) {
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateAddress(ip.to_string()));
        }
    }

    Ok(url)
}

fn host_ip(url: &Url) -> Option<IpAddr> {
    let host = url.host_str()?;
    // IPv6 hosts are bracketed
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse().ok()
}

fn is_loopback_host(url: &Url) -> bool {
    if url.host_str() == Some("localhost") {
        return true;
    }
    host_ip(url).is_some_and(|ip| ip.is_loopback())
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}
