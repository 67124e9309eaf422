use thiserror::Error;
use url::Url;

/// Errors from checking a link before handing it to the system opener.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Validate an entry link before opening it.
///
/// Entry links come from feed content, so anything that is not a plain
/// http(s) URL with a host (`file://`, `javascript:`, custom handlers) is
/// refused rather than passed to the desktop opener.
///
/// ```
/// use feedview::util::validate_link;
///
/// assert!(validate_link("https://example.com/post/1").is_ok());
/// assert!(validate_link("file:///etc/passwd").is_err());
/// ```
pub fn validate_link(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_links_accepted() {
        assert!(validate_link("https://example.com/feed.xml").is_ok());
        assert!(validate_link("http://news.example.org/a?b=c#d").is_ok());
        assert!(validate_link("  https://example.com/padded  ").is_ok());
    }

    #[test]
    fn test_other_schemes_rejected() {
        assert!(matches!(
            validate_link("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme(s)) if s == "file"
        ));
        assert!(validate_link("javascript:alert(1)").is_err());
        assert!(validate_link("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            validate_link("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
        assert!(validate_link("").is_err());
    }
}
