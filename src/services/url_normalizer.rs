//! URL Normalizer.
//!
//! Turns a block of free-form text into candidate URLs: one per non-blank
//! line, trimmed, with exactly one trailing `/` removed. Nothing else is
//! canonicalized; no scheme is inferred, nothing is validated, and duplicates
//! are kept.

/// Removes a single trailing `/`, if present.
///
/// `"http://x.com//"` becomes `"http://x.com/"`.
pub fn trim_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Normalizes one line. Returns `None` for blank input.
///
/// A line consisting only of `/` normalizes to `None` as well, since
/// stripping the slash would leave an empty candidate.
pub fn normalize_url(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let candidate = trim_trailing_slash(trimmed);
    if candidate.trim().is_empty() {
        return None;
    }
    Some(candidate.to_string())
}

/// Splits `text` on newlines and normalizes every line, preserving order.
pub fn normalize_urls(text: &str) -> Vec<String> {
    text.split('\n').filter_map(normalize_url).collect()
}
