//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handlers)
//!     → request.rs (request ID)
//!     → routing (path → upstream feed URL)
//!     → upstream (fetch)
//!     → rewrite (thumbnails, titles)
//!     → response.rs (allow-listed headers, error mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{copy_headers, ProxyError, FORWARDED_RESPONSE_HEADERS};
pub use server::{AppState, HttpServer, ServerError};
