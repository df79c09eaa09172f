//! Cache-Control response headers.
//!
//! # Data Flow
//! ```text
//! Options (access scope, durations, flags)
//!     → options.rs (build the header value once, at registration)
//!     → layer.rs (tower layer inserting Cache-Control into responses)
//! ```
//!
//! # Design Decisions
//! - Header value is computed once per layer, not per request
//! - A handler that sets its own Cache-Control keeps it
//! - No storage, eviction or invalidation: header construction only

pub mod layer;
pub mod options;

pub use layer::{layer, no_cache, no_store, private, public, CacheControlLayer};
pub use options::{Access, Options};
