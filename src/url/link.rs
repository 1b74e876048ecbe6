use super::normalize::normalize_url;
use crate::{UrlError, UrlResult};
use url::Url;

/// Scheme prefix used for local files in the frontier's host table
pub const FILE_HOST: &str = "file://";

/// A link split into the parts the frontier stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// An `https://` page: host plus everything after it
    Web { host: String, inner_path: String },

    /// A `file://` document, identified by its absolute path
    LocalFile { path: String },
}

impl LinkTarget {
    pub fn is_web(&self) -> bool {
        matches!(self, Self::Web { .. })
    }
}

/// Parses an absolute `https://` or `file://` link
///
/// # Examples
///
/// ```
/// use sumi_frontier::url::{parse_link, LinkTarget};
///
/// let target = parse_link("https://Example.com/wiki/Rust#History").unwrap();
/// assert_eq!(
///     target,
///     LinkTarget::Web {
///         host: "example.com".to_string(),
///         inner_path: "/wiki/Rust".to_string(),
///     }
/// );
/// ```
pub fn parse_link(link: &str) -> UrlResult<LinkTarget> {
    let url = Url::parse(link).map_err(|e| UrlError::Parse(e.to_string()))?;
    split_url(url)
}

/// Resolves an `href` found on the page at `base`
///
/// Relative links are joined onto `base`; absolute links are taken as-is.
pub fn resolve_link(base: &Url, href: &str) -> UrlResult<LinkTarget> {
    let url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    split_url(url)
}

/// Splits a parsed URL into a [`LinkTarget`] after normalizing it
pub fn split_url(mut url: Url) -> UrlResult<LinkTarget> {
    normalize_url(&mut url);

    match url.scheme() {
        "https" => {
            let host = extract_host(&url).ok_or(UrlError::MissingDomain)?;
            Ok(LinkTarget::Web {
                host,
                inner_path: inner_path(&url),
            })
        }
        "file" => Ok(LinkTarget::LocalFile {
            path: url.path().to_string(),
        }),
        other => Err(UrlError::InvalidScheme(format!(
            "Only https and file schemes are supported, got: {}",
            other
        ))),
    }
}

/// Extracts the lowercase host of a URL, including a non-default port
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Path plus query string, the part of a URL stored per visit
fn inner_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
