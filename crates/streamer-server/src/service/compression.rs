//! On-the-fly gzip decisions for response bodies.

use axum::http::HeaderMap;
use axum::http::header::ACCEPT_ENCODING;

/// Bodies smaller than this are sent as-is by default.
pub const DEFAULT_MIN_COMPRESSION_SIZE: u64 = 8 * 1024;

const ARCHIVE_EXTENSIONS: &[&str] = &["gz", "tgz", "zip", "rar", "7z", "bz2", "xz", "zst"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "aac", "ogg", "flac", "m4a"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif"];

/// Extensions of formats that are already compressed.
const PRECOMPRESSED_EXTENSIONS: &[&[&str]] = &[
    ARCHIVE_EXTENSIONS,
    VIDEO_EXTENSIONS,
    AUDIO_EXTENSIONS,
    IMAGE_EXTENSIONS,
];

/// Decides whether a response body is worth compressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    min_size: u64,
    denylist: &'static [&'static [&'static str]],
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_COMPRESSION_SIZE)
    }
}

impl CompressionPolicy {
    /// Creates a policy with the given minimum body size.
    pub const fn new(min_size: u64) -> Self {
        Self {
            min_size,
            denylist: PRECOMPRESSED_EXTENSIONS,
        }
    }

    /// Returns the minimum body size that gets compressed.
    #[inline]
    pub const fn min_size(&self) -> u64 {
        self.min_size
    }

    /// Returns `true` if a body of `body_size` bytes for `file_name` should
    /// be gzip-encoded for a client that does (or does not) accept gzip.
    pub fn should_compress(&self, accepts_gzip: bool, file_name: &str, body_size: u64) -> bool {
        accepts_gzip && body_size >= self.min_size && !self.is_precompressed(file_name)
    }

    /// Returns `true` if the file name carries a denylisted extension.
    pub fn is_precompressed(&self, file_name: &str) -> bool {
        let Some((_, extension)) = file_name.rsplit_once('.') else {
            return false;
        };

        self.denylist
            .iter()
            .flat_map(|category| category.iter())
            .any(|denied| extension.eq_ignore_ascii_case(denied))
    }
}

/// Returns `true` if the `Accept-Encoding` headers allow a gzip response.
///
/// `gzip`, `x-gzip` and `*` count when their quality value is non-zero.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(coding_allows_gzip)
}

fn coding_allows_gzip(coding: &str) -> bool {
    let mut params = coding.split(';').map(str::trim);
    let name = params.next().unwrap_or_default();

    let is_gzip = name.eq_ignore_ascii_case("gzip")
        || name.eq_ignore_ascii_case("x-gzip")
        || name == "*";
    if !is_gzip {
        return false;
    }

    params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("q"))
        .map(|(_, quality)| quality.trim().parse::<f32>().is_ok_and(|q| q > 0.0))
        .unwrap_or(true)
}
