//! Shared utilities for integration tests.

use std::fs;
use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use tempfile::TempDir;
use tower::{Service, ServiceExt};

/// Build the directory tree most tests serve from:
///
/// ```text
/// 404.html
/// static/app.js, static/app.js.br, static/app.js.gzip, static/index.html
/// ui/css/site.css, ui/img/logo.gif
/// private/key.txt
/// ```
pub fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        ("404.html", "custom not found"),
        ("static/app.js", "console.log('plain');"),
        ("static/app.js.br", "brotli bytes"),
        ("static/app.js.gzip", "gzip bytes"),
        ("static/index.html", "<h1>static index</h1>"),
        ("ui/css/site.css", "body { margin: 0 }"),
        ("ui/img/logo.gif", "GIF89a"),
        ("private/key.txt", "do not serve"),
    ];
    for (name, data) in files {
        write_file(dir.path(), name, data);
    }
    dir
}

pub fn write_file(root: &Path, name: &str, data: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Send one request with the given method and headers through `service`.
pub async fn send<S>(service: &S, method: Method, uri: &str, headers: &[(&str, &str)]) -> TestResponse
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone,
    S::Error: std::fmt::Debug,
{
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = service
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// `GET uri` through `service`.
#[allow(dead_code)]
pub async fn get<S>(service: &S, uri: &str) -> TestResponse
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone,
    S::Error: std::fmt::Debug,
{
    send(service, Method::GET, uri, &[]).await
}
