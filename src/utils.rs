/// Resolve a link or image path against the site base.
///
/// Root-relative paths are appended to the base, other relative paths get a
/// `/` joiner and anything starting with `http` passes through unchanged.
pub fn normalize_url(url: &str, base_url: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", base_url, url)
    } else if !url.starts_with("http") {
        format!("{}/{}", base_url, url)
    } else {
        url.to_string()
    }
}

/// Extract the numeric timestamp from a storage key such as
/// `index_1700000000000.json` or `scraped_content_1700000000000.json`
pub fn timestamp_from_key(key: &str, prefix: &str) -> Option<i64> {
    key.strip_prefix(prefix)?
        .strip_suffix(".json")?
        .parse::<i64>()
        .ok()
}

/// Convert a page URL to a search document key
pub fn document_id(url: &str, base_url: &str) -> String {
    let relative = url
        .strip_prefix(base_url)
        .unwrap_or(url)
        .trim_start_matches('/');
    let relative = if relative.is_empty() { "home" } else { relative };

    // Keys only allow letters, digits, '_', '-' and '='
    relative
        .replace("http://", "")
        .replace("https://", "")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '=' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// First `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
