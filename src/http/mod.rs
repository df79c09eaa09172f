//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → single-file route match → ContentServer
//!     → otherwise fallback → FileServer (prefix map)
//!     → Cache-Control layer (only if the handler set none)
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpServer;
