//! File server options, merging and finalization.
//!
//! # Responsibilities
//! - Hold the optional knobs of the file handlers
//! - Overlay partial option sets (later sets win field by field)
//! - Resolve the root directory against an explicit base directory
//!
//! # Design Decisions
//! - The working directory is captured once by the application (`BaseDir`)
//!   and passed in, never read from process state during finalization
//! - Empty strings count as unset, an explicit empty encoding list does not
//! - An injected file source overrides the root directory

use std::env;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::file::source::{DirSource, FileSource};
use crate::file::Encoding;

/// Base directory that relative root paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDir(PathBuf);

impl BaseDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Capture the current working directory.
    pub fn current() -> io::Result<Self> {
        env::current_dir().map(Self)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.0.join(path)
        }
    }
}

/// What an allow predicate sees: the request and the response headers built so far.
pub struct AllowContext<'a> {
    request: &'a Parts,
    response_headers: &'a mut HeaderMap,
}

impl<'a> AllowContext<'a> {
    pub fn new(request: &'a Parts, response_headers: &'a mut HeaderMap) -> Self {
        Self {
            request,
            response_headers,
        }
    }

    pub fn request(&self) -> &Parts {
        self.request
    }

    /// Headers added here are sent with the file (e.g. `Expires`).
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        self.response_headers
    }
}

/// Gate deciding whether a resolved path may be served.
pub trait Allow: Send + Sync {
    fn allow(&self, ctx: &mut AllowContext<'_>, path: &str) -> bool;
}

impl<F> Allow for F
where
    F: Fn(&mut AllowContext<'_>, &str) -> bool + Send + Sync,
{
    fn allow(&self, ctx: &mut AllowContext<'_>, path: &str) -> bool {
        self(ctx, path)
    }
}

/// Partial options for the file handlers. Unset fields inherit on merge.
#[derive(Clone, Default)]
pub struct ServerOptions {
    /// Directory all served files live in. Relative paths resolve against the `BaseDir`.
    pub root_path: Option<PathBuf>,
    /// File served for directory requests, e.g. `index.html`.
    pub index_file: Option<String>,
    /// File served when nothing else matches, relative to the root.
    pub catch_all_file: Option<String>,
    pub allow: Option<Arc<dyn Allow>>,
    /// Pre-compressed variants to look for, most preferred first.
    pub compression: Option<Vec<Encoding>>,
    /// File source replacing `root_path`.
    pub fs: Option<Arc<dyn FileSource>>,
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("root_path", &self.root_path)
            .field("index_file", &self.index_file)
            .field("catch_all_file", &self.catch_all_file)
            .field("allow", &self.allow.is_some())
            .field("compression", &self.compression)
            .field("fs", &self.fs)
            .finish()
    }
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_path = Some(path.into());
        self
    }

    pub fn index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = Some(name.into());
        self
    }

    pub fn catch_all_file(mut self, name: impl Into<String>) -> Self {
        self.catch_all_file = Some(name.into());
        self
    }

    pub fn allow<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&mut AllowContext<'_>, &str) -> bool + Send + Sync + 'static,
    {
        self.allow = Some(Arc::new(predicate));
        self
    }

    pub fn allow_policy(mut self, policy: impl Allow + 'static) -> Self {
        self.allow = Some(Arc::new(policy));
        self
    }

    pub fn compression(mut self, encodings: impl IntoIterator<Item = Encoding>) -> Self {
        self.compression = Some(encodings.into_iter().collect());
        self
    }

    pub fn fs(mut self, source: impl FileSource + 'static) -> Self {
        self.fs = Some(Arc::new(source));
        self
    }

    /// Overlay `other` onto `self`; every field set in `other` wins.
    pub fn merge(&self, other: &ServerOptions) -> ServerOptions {
        let mut merged = self.clone();

        if other.allow.is_some() {
            merged.allow.clone_from(&other.allow);
        }
        if let Some(file) = non_empty(&other.catch_all_file) {
            merged.catch_all_file = Some(file.to_string());
        }
        if other.compression.is_some() {
            merged.compression.clone_from(&other.compression);
        }
        if let Some(file) = non_empty(&other.index_file) {
            merged.index_file = Some(file.to_string());
        }
        if let Some(root) = other
            .root_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            merged.root_path = Some(root.clone());
        }
        if other.fs.is_some() {
            merged.fs.clone_from(&other.fs);
        }

        merged
    }

    /// Merge a sequence of option sets onto the defaults, left to right.
    pub fn merge_all<'a>(options: impl IntoIterator<Item = &'a ServerOptions>) -> ServerOptions {
        options
            .into_iter()
            .fold(ServerOptions::default(), |acc, next| acc.merge(next))
    }

    /// Resolve into the immutable configuration used by the handlers.
    pub fn finalize(&self, base: &BaseDir) -> ServeConfig {
        let root = match &self.root_path {
            Some(path) => base.resolve(path),
            None => base.path().to_path_buf(),
        };
        let source: Arc<dyn FileSource> = match &self.fs {
            Some(fs) => Arc::clone(fs),
            None => Arc::new(DirSource::new(root.clone())),
        };

        ServeConfig {
            root,
            index_file: non_empty(&self.index_file).map(str::to_string),
            catch_all_file: non_empty(&self.catch_all_file).map(str::to_string),
            allow: self.allow.clone(),
            compression: self.compression.clone().unwrap_or_default(),
            source,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Finalized, read-only handler configuration.
#[derive(Clone)]
pub struct ServeConfig {
    root: PathBuf,
    index_file: Option<String>,
    catch_all_file: Option<String>,
    allow: Option<Arc<dyn Allow>>,
    compression: Vec<Encoding>,
    source: Arc<dyn FileSource>,
}

impl ServeConfig {
    /// Merge `options` in order and finalize against `base`.
    pub fn from_options(options: &[ServerOptions], base: &BaseDir) -> Self {
        ServerOptions::merge_all(options).finalize(base)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_file(&self) -> Option<&str> {
        self.index_file.as_deref()
    }

    pub fn catch_all_file(&self) -> Option<&str> {
        self.catch_all_file.as_deref()
    }

    pub fn allow(&self) -> Option<&dyn Allow> {
        self.allow.as_deref()
    }

    pub fn compression(&self) -> &[Encoding] {
        &self.compression
    }

    pub fn source(&self) -> &Arc<dyn FileSource> {
        &self.source
    }
}

impl fmt::Debug for ServeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServeConfig")
            .field("root", &self.root)
            .field("index_file", &self.index_file)
            .field("catch_all_file", &self.catch_all_file)
            .field("allow", &self.allow.is_some())
            .field("compression", &self.compression)
            .field("source", &self.source)
            .finish()
    }
}
