//! Content type lookup by file extension.

/// Fallback for unknown or missing extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Maps the suffix after the last `.` in `path` to a MIME type.
///
/// # Example
///
/// ```
/// # use cookie_server::http::mime::content_type;
/// assert_eq!(content_type("public/index.html"), "text/html");
/// assert_eq!(content_type("cookies/7"), "text/plain");
/// ```
pub fn content_type(path: &str) -> &'static str {
    let Some((_, ext)) = path.rsplit_once('.') else {
        return DEFAULT_CONTENT_TYPE;
    };

    match ext {
        "css" => "text/css",
        "csv" => "text/csv",
        "gif" => "image/gif",
        "htm" => "text/htm",
        "html" => "text/html",
        "ico" => "image/x-icon",
        "jpeg" | "jpg" => "image/jpeg",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "pdf" => "application/pdf",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
