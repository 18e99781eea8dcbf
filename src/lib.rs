//! MBTiles tile server library.
//!
//! An HTTP front-end that serves map tiles from files discovered in a
//! watched cache directory. The crate centers on the server lifecycle
//! manager: it owns the shared configuration, starts/stops/restarts
//! the listener, and restarts automatically whenever the cache
//! directory changes on disk.
//!
//! ```text
//! Server::start(options)
//!     → config merged → cache dir created → cache watch armed
//!     → listener bound → Event::Start
//!
//! Request → trace → request id → log tap → permission filter
//!     → info endpoint | tile routes | WMTS routes
//!
//! Cache change → change channel → control loop → restart
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod routes;

pub use config::{ConfigStore, ServerOptions, Settings};
pub use lifecycle::{Event, EventBus, RequestLog, Server, ServerError};
pub use routes::{AllowAll, AppState, PermissionFilter, RouteModule, RouteRegistry};

/// Create a server and start it immediately with the given options.
///
/// Convenience wrapper over [`Server::new`] + [`Server::start`] for
/// embedders that want a running server in one call.
pub async fn serve(options: ServerOptions) -> Result<Server, ServerError> {
    let server = Server::new(options.clone());
    server.start(options).await?;
    Ok(server)
}
