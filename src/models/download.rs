//! Naming rules for downloaded files.
//!
//! A download never exposes the stored key as the client-side filename.
//! Instead it gets `<unix-seconds>_<random>.<ext>`, where the extension comes
//! from the key and drives the advertised MIME type.

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};

/// Extension used when the key has none.
pub const DEFAULT_EXTENSION: &str = ".bin";

const RANDOM_PART_LEN: usize = 10;

/// Client-facing name and type for one download.
#[derive(Debug, Clone)]
pub struct DownloadName {
    pub filename: String,
    pub content_type: String,
}

impl DownloadName {
    pub fn for_key(key: &str) -> Self {
        let ext = resolve_extension(key);
        Self {
            filename: generate_filename(ext),
            content_type: content_type_for(ext),
        }
    }
}

/// Extension of the last path segment of `key`, dot included.
///
/// Falls back to [`DEFAULT_EXTENSION`] when there is no dot, or when the
/// suffix could not be placed verbatim in a `Content-Disposition` header.
pub fn resolve_extension(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.rfind('.') {
        Some(idx) if is_header_safe(&name[idx..]) => &name[idx..],
        _ => DEFAULT_EXTENSION,
    }
}

/// MIME type for an extension such as `.png`; `application/octet-stream` if unknown.
pub fn content_type_for(ext: &str) -> String {
    mime_guess::from_ext(ext.trim_start_matches('.'))
        .first_or_octet_stream()
        .to_string()
}

/// `<unix-seconds>_<10 alphanumerics><ext>`
pub fn generate_filename(ext: &str) -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_PART_LEN)
        .map(char::from)
        .collect();

    format!("{}_{}{}", Utc::now().timestamp(), random, ext)
}

fn is_header_safe(ext: &str) -> bool {
    ext.bytes()
        .all(|b| b.is_ascii_graphic() && !matches!(b, b';' | b'"' | b','))
}
