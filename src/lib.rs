//! Static file serving for axum and tower.
//!
//! Maps URL prefixes onto a directory tree, serves pre-compressed siblings
//! such as `app.js.br` when the client accepts them, and builds
//! `Cache-Control` headers as a tower layer.
//!
//! ```no_run
//! use assetgate::caching;
//! use assetgate::file::{BaseDir, FileServer, ServeConfig, ServerOptions};
//! use axum::Router;
//! use std::time::Duration;
//! use tower::ServiceBuilder;
//!
//! let base = BaseDir::current().unwrap();
//! let options = ServerOptions::new()
//!     .root_path("public")
//!     .index_file("index.html")
//!     .compression(["br".into(), "gzip".into()]);
//! let files = FileServer::new([("/", "/")], ServeConfig::from_options(&[options], &base));
//! let app: Router = Router::new().fallback_service(
//!     ServiceBuilder::new()
//!         .layer(caching::public(Duration::from_secs(3600)))
//!         .service(files),
//! );
//! ```

pub mod caching;
pub mod config;
pub mod file;
pub mod http;
pub mod observability;

pub use config::AppConfig;
pub use file::{ContentServer, FileServer, ServerOptions};
pub use http::HttpServer;
