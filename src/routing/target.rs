//! Absolute upstream URL construction.

use crate::routing::resolver::BaseUrl;

/// Join base URL, path and query into the absolute upstream URL.
///
/// Exactly one `/` separates base and path whatever slashes either side
/// carries. The query is appended unmodified; a leading `?` is tolerated.
/// If `path` already carries its own query, `query` is joined with `&`.
pub fn build_target_url(base: &BaseUrl, path: &str, query: Option<&str>) -> String {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');

    let mut url = String::with_capacity(base.len() + path.len() + 2);
    url.push_str(base);
    url.push('/');
    url.push_str(path);

    if let Some(query) = query.map(|q| q.strip_prefix('?').unwrap_or(q)) {
        if !query.is_empty() {
            url.push(if path.contains('?') { '&' } else { '?' });
            url.push_str(query);
        }
    }

    url
}
