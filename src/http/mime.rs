//! Content-type lookup by file extension.

use std::path::Path;

/// Extension (with its dot) to content type. Read-only, shared by every
/// connection.
static MIME_TYPES: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".htm", "text/html"),
    (".css", "text/css"),
    (".js", "text/javascript"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
    (".swf", "application/x-shockwave-flash"),
    (".txt", "text/plain"),
    (".json", "application/json"),
    (".svg", "image/svg+xml"),
    (".ico", "image/x-icon"),
];

/// Returns the content type for an extension such as `".html"`.
///
/// Lookup ignores ASCII case. Unknown extensions return `None`; callers omit
/// the Content-Type header in that case.
///
/// # Example
///
/// ```
/// # use lantern::http::mime::content_type;
/// assert_eq!(content_type(".png"), Some("image/png"));
/// assert_eq!(content_type(".tar"), None);
/// ```
pub fn content_type(extension: &str) -> Option<&'static str> {
    MIME_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
}

/// Returns the extension of `path` including the leading dot, or `""`.
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Content type for the file at `path`, by extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    content_type(&extension_of(path))
}
