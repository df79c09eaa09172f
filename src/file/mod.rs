//! Static file serving subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, Accept-Encoding)
//!     → validate.rs (GET/HEAD only, percent-decode, reject `..` segments)
//!     → path_map.rs (most specific prefix → backing path)
//!     → options.rs (allow predicate may veto)
//!     → encoding.rs (negotiate server encodings against the client)
//!     → compression_dir.rs (open `<path>.<enc>` variants, then `<path>`)
//!     → source.rs (real directory or in-memory files)
//!     → content.rs (conditional request + range handling, body)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Handlers are built once at route registration and immutable afterwards
//! - File I/O is blocking and runs on the blocking thread pool
//! - Encoded variants are siblings of the plain file (`app.js.br`)
//! - Every failure maps to a fixed status: 400, 404 or 405

pub mod compression_dir;
pub mod content;
pub mod encoding;
pub mod error;
pub mod options;
pub mod path_map;
pub mod server;
pub mod source;
pub mod validate;

pub use compression_dir::CompressionDir;
pub use encoding::{negotiate, Encoding};
pub use error::FileError;
pub use options::{Allow, AllowContext, BaseDir, ServeConfig, ServerOptions};
pub use path_map::{PathMap, PathMapper};
pub use server::{ContentServer, FileServer};
pub use source::{DirSource, FileMeta, FileSource, MemorySource, SourceFile};
