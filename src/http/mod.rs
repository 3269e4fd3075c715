//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign request ID)
//!     → admission gate (reject on open / throttled)
//!     → upstream call, latency reported to the monitor
//!     → response.rs (relay JSON or map error to 500)
//!     → Send to client (always with Access-Control-Allow-Origin: *)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
