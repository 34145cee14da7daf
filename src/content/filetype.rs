//! Content type resolution for uploaded objects
//!
//! A small table of well-known web asset extensions wins outright, since
//! magic-byte sniffing cannot tell JavaScript or CSS apart from plain text.
//! Everything else is sniffed from the leading bytes of the payload using the
//! `infer` crate, with a text/binary fallback when no signature matches.

use std::path::Path;

/// Fallback for payloads that are neither recognised nor text
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type used for payloads that look like text
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Number of leading bytes inspected when sniffing
pub const SNIFF_LEN: usize = 512;

/// Extension overrides, compared case-insensitively
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("css", "text/css"),
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("json", "application/json"),
    ("svg", "image/svg+xml"),
    ("wasm", "application/wasm"),
];

/// Resolve the content type for a file about to be uploaded
///
/// # Example
///
/// ```
/// use s3_backup::content::resolve_content_type;
/// use std::path::Path;
///
/// // Extension wins regardless of content
/// assert_eq!(
///     resolve_content_type(Path::new("app.js"), b"<html></html>"),
///     "application/javascript"
/// );
///
/// // PNG magic bytes under an unknown extension
/// let png = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// assert_eq!(resolve_content_type(Path::new("logo.bin"), png), "image/png");
/// ```
pub fn resolve_content_type(path: &Path, payload: &[u8]) -> String {
    match content_type_for_extension(path) {
        Some(mime) => mime.to_string(),
        None => sniff_content_type(payload),
    }
}

/// Look up the extension override table
pub fn content_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    EXTENSION_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// Detect the MIME type of a payload from its header bytes
///
/// Returns the detected MIME type as a string, or None if the type is unknown.
pub fn detect_file_type(header: &[u8]) -> Option<String> {
    infer::get(header).map(|kind| kind.mime_type().to_string())
}

/// Sniff a content type from the first [`SNIFF_LEN`] bytes of a payload
pub fn sniff_content_type(payload: &[u8]) -> String {
    let header = &payload[..payload.len().min(SNIFF_LEN)];

    if let Some(mime) = detect_file_type(header) {
        return mime;
    }

    if looks_like_html(header) {
        return "text/html; charset=utf-8".to_string();
    }

    if looks_like_text(header) {
        TEXT_PLAIN.to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}

fn looks_like_html(header: &[u8]) -> bool {
    let start = header
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(header.len());
    let trimmed = &header[start..];

    ["<!doctype html", "<html", "<head", "<body"]
        .iter()
        .any(|tag| {
            trimmed.len() >= tag.len() && trimmed[..tag.len()].eq_ignore_ascii_case(tag.as_bytes())
        })
}

/// Text if valid UTF-8 (a multi-byte char cut at the sniff boundary is fine)
/// and free of control bytes other than whitespace.
fn looks_like_text(header: &[u8]) -> bool {
    let valid = match std::str::from_utf8(header) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };

    valid
        && !header
            .iter()
            .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_extension_wins_over_content() {
        let png_header = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(
            resolve_content_type(Path::new("dist/app.js"), png_header),
            "application/javascript"
        );
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(
            content_type_for_extension(Path::new("STYLE.CSS")),
            Some("text/css")
        );
        assert_eq!(content_type_for_extension(Path::new("Makefile")), None);
    }

    #[test]
    fn test_detect_png() {
        let png_header = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(
            resolve_content_type(Path::new("image.dat"), png_header),
            "image/png"
        );
    }

    #[test]
    fn test_detect_pdf() {
        assert_eq!(sniff_content_type(b"%PDF-1.5"), "application/pdf");
    }

    #[test]
    fn test_plain_text_fallback() {
        assert_eq!(
            resolve_content_type(Path::new("README"), b"hello world\n"),
            TEXT_PLAIN
        );
    }

    #[test]
    fn test_html_sniffed() {
        assert_eq!(
            sniff_content_type(b"  <!DOCTYPE html><html></html>"),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_binary_fallback() {
        let unknown = &[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        assert_eq!(sniff_content_type(unknown), OCTET_STREAM);
    }

    #[test]
    fn test_empty_payload_is_text() {
        assert_eq!(sniff_content_type(&[]), TEXT_PLAIN);
    }

    #[test]
    fn test_utf8_cut_at_sniff_boundary() {
        let mut payload = vec![b'a'; SNIFF_LEN - 1];
        payload.extend_from_slice("é".as_bytes());
        assert_eq!(sniff_content_type(&payload), TEXT_PLAIN);
    }
}
