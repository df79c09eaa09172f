//! Serving an opened file with conditional request support.
//!
//! # Responsibilities
//! - Content-Type from the logical name, Content-Length, Last-Modified
//! - If-Unmodified-Since (412) and If-Modified-Since (304)
//! - Single byte range requests with If-Range (206 / 416)
//! - HEAD responses without a body
//! - Stream bodies larger than one chunk
//!
//! # Design Decisions
//! - Validators are modification-time based; no content hashing
//! - Bodies up to `CHUNK_SIZE` are read inline; larger ones are read one
//!   chunk at a time on the blocking pool as the body is polled, and the file
//!   is released when the body completes or is dropped
//! - HTTP dates have one-second resolution, comparisons truncate the mtime
//! - Multi-range requests are answered with the full content

use std::io::{self, Read, Seek, SeekFrom};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use httpdate::HttpDate;

use crate::file::source::{FileMeta, SourceFile};

/// Read size for streamed bodies; bodies up to this size are buffered.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// An inclusive byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Range header parse result.
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Exactly one satisfiable range.
    Valid(ByteRange),
    /// Malformed, or no range overlaps the content: 416.
    NotSatisfiable,
    /// Serve the full content (several ranges, or nothing usable requested).
    Full,
}

/// Parse a `Range` header value against a content of `size` bytes.
pub fn parse_range_header(value: &str, size: u64) -> RangeParseResult {
    let Some(byte_ranges) = value.trim().strip_prefix("bytes=") else {
        return RangeParseResult::NotSatisfiable;
    };

    let mut ranges = Vec::new();
    let mut overlap_missed = false;

    for part in byte_ranges.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((start, end)) = part.split_once('-') else {
            return RangeParseResult::NotSatisfiable;
        };
        let (start, end) = (start.trim(), end.trim());

        if start.is_empty() {
            // Suffix range: the last `end` bytes.
            let Ok(suffix) = end.parse::<u64>() else {
                return RangeParseResult::NotSatisfiable;
            };
            if suffix == 0 || size == 0 {
                overlap_missed = true;
                continue;
            }
            let suffix = suffix.min(size);
            ranges.push(ByteRange {
                start: size - suffix,
                end: size - 1,
            });
            continue;
        }

        let Ok(first) = start.parse::<u64>() else {
            return RangeParseResult::NotSatisfiable;
        };
        if first >= size {
            overlap_missed = true;
            continue;
        }
        let last = if end.is_empty() {
            size - 1
        } else {
            match end.parse::<u64>() {
                Ok(last) if last >= first => last.min(size - 1),
                _ => return RangeParseResult::NotSatisfiable,
            }
        };
        ranges.push(ByteRange {
            start: first,
            end: last,
        });
    }

    match ranges.as_slice() {
        [] if overlap_missed => RangeParseResult::NotSatisfiable,
        [single] => RangeParseResult::Valid(*single),
        _ => RangeParseResult::Full,
    }
}

fn header_date(headers: &HeaderMap, name: header::HeaderName) -> Option<HttpDate> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<HttpDate>().ok())
}

fn last_modified(meta: &FileMeta) -> Option<HttpDate> {
    meta.modified
        .filter(|t| *t > UNIX_EPOCH)
        .map(HttpDate::from)
}

/// Whether an `If-Range` header allows the range to be honoured.
fn if_range_allows(headers: &HeaderMap, modified: Option<HttpDate>) -> bool {
    let Some(value) = headers.get(header::IF_RANGE).and_then(|v| v.to_str().ok()) else {
        return true;
    };
    let value = value.trim();
    // Entity tags never match: no ETag is produced.
    if value.starts_with('"') || value.starts_with("W/") {
        return false;
    }
    match (value.parse::<HttpDate>(), modified) {
        (Ok(date), Some(modified)) => SystemTime::from(date) == SystemTime::from(modified),
        _ => false,
    }
}

fn empty_response(status: StatusCode, headers: HeaderMap) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Body for `len` bytes of `file` starting at `start`.
fn range_body(mut file: Box<dyn SourceFile>, start: u64, len: u64) -> io::Result<Body> {
    file.seek(SeekFrom::Start(start))?;

    if len <= CHUNK_SIZE as u64 {
        let mut buf = vec![0; usize::try_from(len).unwrap_or(CHUNK_SIZE)];
        file.read_exact(&mut buf)?;
        return Ok(Body::from(buf));
    }

    let chunks = futures_util::stream::try_unfold((file, len), |(file, remaining)| async move {
        if remaining == 0 {
            return Ok::<_, io::Error>(None);
        }
        let want = usize::try_from(remaining.min(CHUNK_SIZE as u64)).unwrap_or(CHUNK_SIZE);
        let (file, chunk) = tokio::task::spawn_blocking(move || {
            let mut file = file;
            let mut buf = vec![0; want];
            file.read_exact(&mut buf)?;
            Ok::<_, io::Error>((file, buf))
        })
        .await
        .map_err(io::Error::other)??;
        let remaining = remaining - chunk.len() as u64;
        Ok(Some((Bytes::from(chunk), (file, remaining))))
    });
    Ok(Body::from_stream(chunks))
}

/// Build the response for an opened plain file.
///
/// `name` is the logical path used for the content type; `headers` carries
/// any response headers set earlier (Content-Encoding, Vary, allow hooks).
pub fn serve_content(
    request: &Parts,
    name: &str,
    file: Box<dyn SourceFile>,
    meta: &FileMeta,
    mut headers: HeaderMap,
) -> io::Result<Response> {
    let modified = last_modified(meta);
    if let Some(modified) = modified {
        if let Ok(value) = HeaderValue::from_str(&modified.to_string()) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }

    if let (Some(modified), Some(since)) = (
        modified,
        header_date(&request.headers, header::IF_UNMODIFIED_SINCE),
    ) {
        if modified > since {
            return Ok(empty_response(StatusCode::PRECONDITION_FAILED, headers));
        }
    }

    let is_get_or_head = request.method == Method::GET || request.method == Method::HEAD;
    if let (true, Some(modified), Some(since)) = (
        is_get_or_head,
        modified,
        header_date(&request.headers, header::IF_MODIFIED_SINCE),
    ) {
        if modified <= since {
            headers.remove(header::CONTENT_TYPE);
            headers.remove(header::CONTENT_LENGTH);
            headers.remove(header::CONTENT_ENCODING);
            return Ok(empty_response(StatusCode::NOT_MODIFIED, headers));
        }
    }

    if !headers.contains_key(header::CONTENT_TYPE) {
        let mime = mime_guess::from_path(name).first_or_octet_stream();
        if let Ok(value) = HeaderValue::from_str(mime.essence_str()) {
            headers.insert(header::CONTENT_TYPE, value);
        }
    }
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let size = meta.len;
    let mut status = StatusCode::OK;
    let mut range = ByteRange {
        start: 0,
        end: size.saturating_sub(1),
    };

    let range_header = request
        .headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());
    if let Some(value) = range_header.filter(|_| if_range_allows(&request.headers, modified)) {
        match parse_range_header(value, size) {
            RangeParseResult::Valid(r) => {
                status = StatusCode::PARTIAL_CONTENT;
                range = r;
                if let Ok(v) = HeaderValue::from_str(&r.content_range(size)) {
                    headers.insert(header::CONTENT_RANGE, v);
                }
            }
            RangeParseResult::NotSatisfiable => {
                if let Ok(v) = HeaderValue::from_str(&format!("bytes */{size}")) {
                    headers.insert(header::CONTENT_RANGE, v);
                }
                return Ok(empty_response(StatusCode::RANGE_NOT_SATISFIABLE, headers));
            }
            RangeParseResult::Full => {}
        }
    }

    let len = if size == 0 { 0 } else { range.len() };
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    let body = if request.method == Method::HEAD || len == 0 {
        Body::empty()
    } else {
        range_body(file, range.start, len)?
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{FileSource, MemorySource};
    use std::time::Duration;

    fn mtime() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn serve(builder: axum::http::request::Builder) -> Response {
        let mut source = MemorySource::new();
        source.insert("doc.txt", "0123456789", Some(mtime()));
        let file = source.open("doc.txt").unwrap();
        let meta = file.metadata().unwrap();
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        serve_content(&parts, "doc.txt", file, &meta, HeaderMap::new()).unwrap()
    }

    async fn body(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get() -> axum::http::request::Builder {
        axum::http::Request::builder().uri("/doc.txt")
    }

    #[test]
    fn test_parse_range_header() {
        use RangeParseResult::*;
        assert_eq!(parse_range_header("bytes=0-4", 10), Valid(ByteRange { start: 0, end: 4 }));
        assert_eq!(parse_range_header("bytes=5-", 10), Valid(ByteRange { start: 5, end: 9 }));
        assert_eq!(parse_range_header("bytes=-3", 10), Valid(ByteRange { start: 7, end: 9 }));
        assert_eq!(parse_range_header("bytes=-30", 10), Valid(ByteRange { start: 0, end: 9 }));
        assert_eq!(parse_range_header("bytes=8-100", 10), Valid(ByteRange { start: 8, end: 9 }));
        assert_eq!(parse_range_header("bytes=10-", 10), NotSatisfiable);
        assert_eq!(parse_range_header("bytes=5-2", 10), NotSatisfiable);
        assert_eq!(parse_range_header("items=0-1", 10), NotSatisfiable);
        assert_eq!(parse_range_header("bytes=abc", 10), NotSatisfiable);
        assert_eq!(parse_range_header("bytes=0-1,4-5", 10), Full);
        assert_eq!(parse_range_header("bytes=", 10), Full);
    }

    #[tokio::test]
    async fn test_full_response() {
        let response = serve(get());
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::CONTENT_LENGTH], "10");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(
            headers[header::LAST_MODIFIED],
            HttpDate::from(mtime()).to_string().as_str()
        );
        assert_eq!(body(response).await, "0123456789");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let response = serve(get().method(Method::HEAD));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");
        assert_eq!(body(response).await, "");
    }

    #[tokio::test]
    async fn test_range_request() {
        let response = serve(get().header(header::RANGE, "bytes=2-5"));
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/10");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        assert_eq!(body(response).await, "2345");
    }

    #[test]
    fn test_unsatisfiable_range() {
        let response = serve(get().header(header::RANGE, "bytes=50-60"));
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */10");
    }

    #[test]
    fn test_not_modified() {
        let since = HttpDate::from(mtime() + Duration::from_secs(60)).to_string();
        let response = serve(get().header(header::IF_MODIFIED_SINCE, since));
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());

        let exact = HttpDate::from(mtime()).to_string();
        let response = serve(get().header(header::IF_MODIFIED_SINCE, exact));
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[test]
    fn test_modified_since_older_date() {
        let since = HttpDate::from(mtime() - Duration::from_secs(60)).to_string();
        let response = serve(get().header(header::IF_MODIFIED_SINCE, since));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_precondition_failed() {
        let since = HttpDate::from(mtime() - Duration::from_secs(60)).to_string();
        let response = serve(get().header(header::IF_UNMODIFIED_SINCE, since));
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_if_range() {
        let exact = HttpDate::from(mtime()).to_string();
        let response = serve(
            get()
                .header(header::RANGE, "bytes=0-1")
                .header(header::IF_RANGE, exact),
        );
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);

        let response = serve(
            get()
                .header(header::RANGE, "bytes=0-1")
                .header(header::IF_RANGE, "\"some-etag\""),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, "0123456789");
    }

    async fn frames(response: Response) -> Vec<Bytes> {
        use futures_util::StreamExt;
        response
            .into_body()
            .into_data_stream()
            .map(|frame| frame.unwrap())
            .collect()
            .await
    }

    fn large_source(len: usize) -> (MemorySource, Vec<u8>) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut source = MemorySource::new();
        source.insert("big.bin", data.clone(), Some(mtime()));
        (source, data)
    }

    fn serve_large(source: &MemorySource, builder: axum::http::request::Builder) -> Response {
        let file = source.open("big.bin").unwrap();
        let meta = file.metadata().unwrap();
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        serve_content(&parts, "big.bin", file, &meta, HeaderMap::new()).unwrap()
    }

    #[tokio::test]
    async fn test_large_body_is_streamed_in_chunks() {
        let (source, data) = large_source(4 * CHUNK_SIZE + 17);
        let response = serve_large(&source, axum::http::Request::builder().uri("/big.bin"));

        assert_eq!(response.headers()[header::CONTENT_LENGTH], data.len().to_string().as_str());
        // Nothing has been read up front.
        assert_eq!(axum::body::HttpBody::size_hint(response.body()).exact(), None);

        let frames = frames(response).await;
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| f.len() <= CHUNK_SIZE));
        assert_eq!(frames.concat(), data);
    }

    #[tokio::test]
    async fn test_large_range_is_streamed() {
        let (source, data) = large_source(3 * CHUNK_SIZE);
        let start = CHUNK_SIZE / 2;
        let end = 2 * CHUNK_SIZE + 9;
        let response = serve_large(
            &source,
            axum::http::Request::builder()
                .uri("/big.bin")
                .header(header::RANGE, format!("bytes={start}-{end}")),
        );

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let frames = frames(response).await;
        assert!(frames.len() > 1);
        assert_eq!(frames.concat(), &data[start..=end]);
    }

    #[test]
    fn test_keeps_preset_headers() {
        let source = MemorySource::new().with_file("app.js.br", "xx");
        let file = source.open("app.js.br").unwrap();
        let meta = file.metadata().unwrap();
        let (parts, ()) = get().body(()).unwrap().into_parts();
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("br"));

        let response = serve_content(&parts, "app.js", file, &meta, headers).unwrap();
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"));
        // No mtime, no Last-Modified.
        assert!(response.headers().get(header::LAST_MODIFIED).is_none());
    }
}
