//! Content-encoding tokens and negotiation against `Accept-Encoding`.
//!
//! # Design Decisions
//! - Server order expresses preference; client order is ignored
//! - Tokens are compared after trimming and lowercasing, without q-values
//! - The token doubles as the file suffix of a pre-compressed variant

use std::borrow::Cow;
use std::fmt;

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// A content-encoding token, e.g. `br` or `gzip`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Encoding(Cow<'static, str>);

impl Encoding {
    pub const BROTLI: Encoding = Encoding(Cow::Borrowed("br"));
    pub const GZIP: Encoding = Encoding(Cow::Borrowed("gzip"));

    /// Create an encoding from an arbitrary token. The token is lowercased.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Cow::Owned(token.into().trim().to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Encoding {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl From<&'static str> for Encoding {
    fn from(token: &'static str) -> Self {
        Self::new(token)
    }
}

impl From<Encoding> for String {
    fn from(encoding: Encoding) -> Self {
        encoding.0.into_owned()
    }
}

/// Return the encodings from `available` that the client accepts, in server order.
///
/// An empty `available` list short-circuits without looking at the header.
pub fn negotiate(accept_encoding: Option<&str>, available: &[Encoding]) -> Vec<Encoding> {
    if available.is_empty() {
        return Vec::new();
    }

    let accepted: Vec<String> = accept_encoding
        .unwrap_or_default()
        .split(',')
        .map(|token| token.trim().to_ascii_lowercase())
        .collect();

    available
        .iter()
        .filter(|enc| accepted.iter().any(|token| token == enc.as_str()))
        .cloned()
        .collect()
}

/// Negotiate using the `Accept-Encoding` header of a request.
pub fn negotiate_headers(headers: &HeaderMap, available: &[Encoding]) -> Vec<Encoding> {
    let accept = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok());
    negotiate(accept, available)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_encodings() -> Vec<Encoding> {
        vec![Encoding::BROTLI, Encoding::GZIP]
    }

    #[test]
    fn test_negotiate_keeps_server_order() {
        let got = negotiate(Some("gzip, deflate"), &server_encodings());
        assert_eq!(got, vec![Encoding::GZIP]);

        let got = negotiate(Some("gzip, br"), &server_encodings());
        assert_eq!(got, vec![Encoding::BROTLI, Encoding::GZIP]);
    }

    #[test]
    fn test_negotiate_empty_header() {
        assert!(negotiate(Some(""), &server_encodings()).is_empty());
        assert!(negotiate(None, &server_encodings()).is_empty());
        assert!(negotiate(Some(",,;"), &server_encodings()).is_empty());
    }

    #[test]
    fn test_negotiate_normalizes_tokens() {
        let got = negotiate(Some("  GZIP ,BR"), &server_encodings());
        assert_eq!(got, vec![Encoding::BROTLI, Encoding::GZIP]);
    }

    #[test]
    fn test_negotiate_without_server_encodings() {
        assert!(negotiate(Some("gzip, br"), &[]).is_empty());
    }

    #[test]
    fn test_negotiate_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_ENCODING, "br".parse().unwrap());
        assert_eq!(
            negotiate_headers(&headers, &server_encodings()),
            vec![Encoding::BROTLI]
        );
        assert!(negotiate_headers(&HeaderMap::new(), &server_encodings()).is_empty());
    }

    #[test]
    fn test_custom_encoding_is_lowercased() {
        let zstd = Encoding::new(" ZSTD ");
        assert_eq!(zstd.as_str(), "zstd");
        assert_eq!(negotiate(Some("zstd"), &[zstd.clone()]), vec![zstd]);
    }
}
