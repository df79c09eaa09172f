//! File serving handlers.
//!
//! # Responsibilities
//! - `FileServer`: map request paths through a `PathMapper` and serve the
//!   backing file, with index file and catch-all fallbacks
//! - `ContentServer`: serve one fixed file
//! - Expose both as tower services for `Router::route_service` and
//!   `Router::fallback_service`
//!
//! # Design Decisions
//! - Request handling is synchronous and runs via `spawn_blocking`
//! - Index and catch-all files are served without further fallbacks
//! - Allow predicates only see mapped paths; the catch-all is never gated

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tower::Service;

use crate::file::compression_dir::CompressionDir;
use crate::file::encoding::negotiate_headers;
use crate::file::options::{AllowContext, ServeConfig};
use crate::file::path_map::PathMapper;
use crate::file::source::{DirSource, FileMeta, FileSource, SourceFile};
use crate::file::{content, validate, Encoding, FileError};
use crate::observability::metrics;

/// Response headers every file response from `config` starts with.
fn base_headers(config: &ServeConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if !config.compression().is_empty() {
        headers.insert(header::VARY, HeaderValue::from_static("accept-encoding"));
    }
    headers
}

/// Open `path` and serve it as a plain file. Directories are not found.
fn serve_file(
    request: &Parts,
    dir: &CompressionDir<'_>,
    path: &str,
    headers: HeaderMap,
) -> Result<Response, FileError> {
    let (file, encoding) = dir.open(path).map_err(FileError::not_found)?;
    let meta = file.metadata().map_err(FileError::not_found)?;
    if meta.is_dir {
        return Err(FileError::NotFound(None));
    }
    respond(request, path, file, &meta, encoding, headers)
}

fn respond(
    request: &Parts,
    path: &str,
    file: Box<dyn SourceFile>,
    meta: &FileMeta,
    encoding: Option<Encoding>,
    mut headers: HeaderMap,
) -> Result<Response, FileError> {
    if let Some(encoding) = &encoding {
        match HeaderValue::from_str(encoding.as_str()) {
            Ok(value) => {
                headers.insert(header::CONTENT_ENCODING, value);
            }
            Err(_) => {
                tracing::warn!(encoding = %encoding, "Encoding token is not a valid header value");
            }
        }
    }

    tracing::debug!(
        path = %path,
        encoding = encoding.as_ref().map(|e| e.as_str()).unwrap_or("identity"),
        size = meta.len,
        "Serving file"
    );
    let response = content::serve_content(request, path, file, meta, headers).map_err(|e| {
        tracing::warn!(path = %path, error = %e, "Failed to read file");
        FileError::not_found(e)
    })?;
    metrics::record_served(encoding.as_ref());
    Ok(response)
}

/// Run a blocking handler and turn its outcome into a response.
async fn run_blocking<F>(handler: F) -> Response
where
    F: FnOnce() -> Result<Response, FileError> + Send + 'static,
{
    match tokio::task::spawn_blocking(handler).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            tracing::debug!(status = %err.status(), error = %err, "File request rejected");
            metrics::record_rejected(err.status());
            err.into_response()
        }
        Err(join_err) => {
            tracing::error!(error = %join_err, "File handler task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

struct FileServerInner {
    mapper: PathMapper,
    config: ServeConfig,
}

impl FileServerInner {
    fn handle(&self, request: &Parts) -> Result<Response, FileError> {
        validate::check_method(&request.method)?;
        let path = validate::request_path(request.uri.path())?;

        let encodings = negotiate_headers(&request.headers, self.config.compression());
        let dir = CompressionDir::new(self.config.source().as_ref(), &encodings);
        let mut headers = base_headers(&self.config);

        let Some(resolved) = self.mapper.matches(&path) else {
            tracing::debug!(path = %path, "No path mapping matched");
            return match self.config.catch_all_file() {
                Some(catch_all) => serve_file(request, &dir, catch_all, headers),
                None => Err(FileError::NotFound(None)),
            };
        };

        if let Some(allow) = self.config.allow() {
            let mut ctx = AllowContext::new(request, &mut headers);
            if !allow.allow(&mut ctx, &resolved) {
                tracing::debug!(path = %resolved, "Denied by allow predicate");
                return Err(FileError::NotFound(None));
            }
        }

        let (file, encoding) = match dir.open(&resolved) {
            Ok(opened) => opened,
            Err(err) => {
                return match self.config.catch_all_file() {
                    Some(catch_all) => serve_file(request, &dir, catch_all, headers),
                    None => Err(FileError::not_found(err)),
                };
            }
        };

        let meta = file.metadata().map_err(FileError::not_found)?;
        if meta.is_dir {
            drop(file);
            return match self.config.index_file() {
                Some(index) => {
                    let index_path = format!("{}/{}", resolved.trim_end_matches('/'), index);
                    serve_file(request, &dir, &index_path, headers)
                }
                None => Err(FileError::NotFound(None)),
            };
        }

        respond(request, &resolved, file, &meta, encoding, headers)
    }
}

/// Serves files selected by a prefix mapping.
///
/// ```no_run
/// use assetgate::file::{BaseDir, FileServer, ServeConfig, ServerOptions};
/// use axum::Router;
///
/// let base = BaseDir::current().unwrap();
/// let config = ServeConfig::from_options(&[ServerOptions::new().root_path("ui")], &base);
/// let files = FileServer::new([("/css", "/dist/css"), ("/js", "/dist/js")], config);
/// let app: Router = Router::new().fallback_service(files);
/// ```
#[derive(Clone)]
pub struct FileServer {
    inner: Arc<FileServerInner>,
}

impl FileServer {
    pub fn new<I, K, V>(path_map: I, config: ServeConfig) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapper = PathMapper::new(path_map);
        tracing::debug!(
            prefixes = ?mapper.prefixes().collect::<Vec<_>>(),
            root = %config.root().display(),
            "File server configured"
        );
        Self {
            inner: Arc::new(FileServerInner { mapper, config }),
        }
    }

    pub fn config(&self) -> &ServeConfig {
        &self.inner.config
    }

    /// Serve one request.
    pub async fn serve(&self, request: Parts) -> Response {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.handle(&request)).await
    }
}

impl<B> Service<Request<B>> for FileServer {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let (parts, _body) = request.into_parts();
        let this = self.clone();
        Box::pin(async move { Ok(this.serve(parts).await) })
    }
}

struct ContentServerInner {
    source: Arc<dyn FileSource>,
    name: String,
    config: ServeConfig,
}

impl ContentServerInner {
    fn handle(&self, request: &Parts) -> Result<Response, FileError> {
        validate::check_method(&request.method)?;
        validate::request_path(request.uri.path())?;

        let encodings = negotiate_headers(&request.headers, self.config.compression());
        let dir = CompressionDir::new(self.source.as_ref(), &encodings);
        serve_file(request, &dir, &self.name, base_headers(&self.config))
    }
}

/// Serves a single fixed file, e.g. `/favicon.ico`.
///
/// Relative paths are opened from the configured source; absolute paths from
/// their parent directory, so `<file>.<enc>` siblings are still found.
#[derive(Clone)]
pub struct ContentServer {
    inner: Arc<ContentServerInner>,
}

impl ContentServer {
    pub fn new(path: impl AsRef<Path>, config: ServeConfig) -> Self {
        let path = path.as_ref();
        let (source, name): (Arc<dyn FileSource>, String) = if path.is_absolute() {
            let parent = path.parent().unwrap_or(path);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (Arc::new(DirSource::new(parent)), name)
        } else {
            let name = path
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            (Arc::clone(config.source()), name)
        };

        tracing::debug!(file = %name, "Content server configured");
        Self {
            inner: Arc::new(ContentServerInner {
                source,
                name,
                config,
            }),
        }
    }

    pub async fn serve(&self, request: Parts) -> Response {
        let inner = Arc::clone(&self.inner);
        run_blocking(move || inner.handle(&request)).await
    }
}

impl<B> Service<Request<B>> for ContentServer {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let (parts, _body) = request.into_parts();
        let this = self.clone();
        Box::pin(async move { Ok(this.serve(parts).await) })
    }
}
