//! Content-encoding helpers.

use flate2::read::GzDecoder;
use reqwest::header::{CONTENT_ENCODING, HeaderMap};
use std::io::Read;

/// Returns `true` when the response declares a gzip content encoding.
///
/// Handles comma-separated encoding lists and repeated headers.
pub fn is_gzipped(headers: &HeaderMap) -> bool {
    headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|coding| {
            let coding = coding.trim();
            coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip")
        })
}

/// Inflates a gzip stream.
pub fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::with_capacity(bytes.len() * 4);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use reqwest::header::HeaderValue;
    use std::io::Write;

    fn headers_with(encoding: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
        headers
    }

    #[test]
    fn test_detects_gzip() {
        assert!(is_gzipped(&headers_with("gzip")));
        assert!(is_gzipped(&headers_with("GZIP")));
        assert!(is_gzipped(&headers_with("identity, gzip")));
    }

    #[test]
    fn test_other_encodings_are_not_gzip() {
        assert!(!is_gzipped(&HeaderMap::new()));
        assert!(!is_gzipped(&headers_with("br")));
        assert!(!is_gzipped(&headers_with("deflate")));
    }

    #[test]
    fn test_gunzip_inflates() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"b\":2}").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(gunzip(&compressed).unwrap(), b"{\"b\":2}");
    }

    #[test]
    fn test_gunzip_rejects_plain_bytes() {
        assert!(gunzip(b"{\"b\":2}").is_err());
    }
}
