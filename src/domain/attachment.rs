use std::path::PathBuf;

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Sanitized name the file was written under.
    pub file_name: String,
    /// URL path the file is served from, e.g. `/uploads/<chat>/<name>`.
    pub public_url: String,
    pub server_path: PathBuf,
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
///
/// Names that would still resolve to the directory itself (`""`, `.`, `..`)
/// become `file`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let safe: String =
        name.chars().map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' }).collect();

    if safe.chars().all(|c| c == '.') { "file".to_string() } else { safe }
}

/// Best-effort MIME type from the file extension, used when the uploader did
/// not send one.
#[must_use]
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => "application/octet-stream",
    }
}
