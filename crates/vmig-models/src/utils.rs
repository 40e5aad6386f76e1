//! Naming helpers shared by the worker and the host client.

/// Extract the remote id from a resource URI.
///
/// `/videos/123` -> `123`. Trailing slashes and query strings are ignored.
pub fn remote_id_from_uri(uri: &str) -> Option<String> {
    let path = uri.split(['?', '#']).next().unwrap_or("");
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Companion filename for `source` with the given extension.
///
/// `talk.mp4` + `jpg` -> `talk.jpg`.
pub fn companion_filename(source: &str, companion_ext: &str) -> String {
    let ext = companion_ext.trim_start_matches('.');
    let stem = match source.rfind('.') {
        Some(idx) if idx > 0 => &source[..idx],
        _ => source,
    };
    format!("{}.{}", stem, ext)
}
