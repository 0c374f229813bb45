//! Final path segment of a URL.

/// Returns the final path segment of a URL exactly as it appears in the
/// URL (still percent-encoded). The query and fragment are not part of it.
///
/// Returns `None` if the URL cannot be parsed or has an opaque path
/// (`mailto:`, `data:`). A path ending in `/` yields `Some("")`.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    if parsed.cannot_be_a_base() {
        return None;
    }
    parsed.path_segments()?.last().map(str::to_string)
}
