//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ServerOptions (CLI flags or embedding caller)
//!     → schema.rs (merge over current settings)
//!     → Settings (fully resolved)
//!     → store.rs (atomic snapshot swap)
//!     → read by request handlers and the info endpoint
//!
//! On restart:
//!     lifecycle merges the new options and swaps the snapshot
//!     before the listener rebinds
//! ```

pub mod schema;
pub mod store;

pub use schema::{ServerOptions, Settings};
pub use store::ConfigStore;
