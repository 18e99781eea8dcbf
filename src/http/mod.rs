//! HTTP middleware.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → trace layer (tower-http)
//!     → request.rs (assign x-request-id)
//!     → log.rs (emit Log event, request unchanged)
//!     → permission filter
//!     → route chain
//! ```

pub mod log;
pub mod request;

pub use request::{RequestIdLayer, X_REQUEST_ID};
