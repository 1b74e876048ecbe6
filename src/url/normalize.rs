use url::Url;

/// Query parameters that only carry tracking information
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL in place before it is split for the frontier
///
/// # Normalization Steps
///
/// 1. Remove the fragment (everything after `#`)
/// 2. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, `mc_eid`)
/// 3. Sort the remaining query parameters by key
/// 4. Remove an empty query string
///
/// Host lowercasing and dot-segment removal are already done by the `url`
/// parser.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_frontier::url::normalize_url;
///
/// let mut url = Url::parse("https://Example.com/a/../b?z=1&utm_source=x&a=2#top").unwrap();
/// normalize_url(&mut url);
/// assert_eq!(url.as_str(), "https://example.com/b?a=2&z=1");
/// ```
pub fn normalize_url(url: &mut Url) {
    url.set_fragment(None);

    if url.query().is_none() {
        return;
    }

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if params.is_empty() {
        url.set_query(None);
        return;
    }

    params.sort_by(|a, b| a.0.cmp(&b.0));
    url.query_pairs_mut().clear().extend_pairs(params);
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
