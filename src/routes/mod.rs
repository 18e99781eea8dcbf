//! Route composition.
//!
//! # Responsibilities
//! - Define the contract external route modules implement
//! - Compose the handler chain in fixed order: logging tap, permission
//!   filter, info endpoint, then the external modules (tile server,
//!   WMTS server)
//!
//! # Design Decisions
//! - Route modules contribute plain axum routers; composition is a
//!   merge, so modules stay independently developed
//! - The permission filter may short-circuit with a status code but
//!   cannot alter requests it lets through
//! - The logging tap runs before the permission filter and sees every
//!   request, including denied ones

pub mod api;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ConfigStore;
use crate::http::{log, RequestIdLayer};
use crate::lifecycle::events::EventBus;

/// State shared with every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigStore,
    pub events: EventBus,
    pub permission: Arc<dyn PermissionFilter>,
}

/// Request authorization hook, consulted before any route runs.
pub trait PermissionFilter: Send + Sync + 'static {
    /// Allow the request through, or short-circuit with the given
    /// status code.
    fn check(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Result<(), StatusCode>;
}

/// Default filter: every request is allowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PermissionFilter for AllowAll {
    fn check(&self, _: &Method, _: &Uri, _: &HeaderMap) -> Result<(), StatusCode> {
        Ok(())
    }
}

/// An externally developed group of routes, e.g. the tile server or
/// the WMTS capability server.
pub trait RouteModule: Send + Sync {
    /// Module name, used in logs.
    fn name(&self) -> &str;

    /// The routes this module contributes.
    fn router(&self) -> Router<AppState>;
}

/// Collects route modules and builds the composed handler chain.
#[derive(Default)]
pub struct RouteRegistry {
    modules: Vec<Box<dyn RouteModule>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Append a module to the chain. Modules run after the info
    /// endpoint, in registration order.
    pub fn register(&mut self, module: Box<dyn RouteModule>) {
        self.modules.push(module);
    }

    /// Build the full router: info endpoint and registered modules
    /// behind the permission filter, the logging tap, request IDs and
    /// the trace layer.
    pub fn build(&self, state: AppState) -> Router {
        let mut router = Router::new().merge(api::router());
        for module in &self.modules {
            tracing::debug!(module = module.name(), "route module registered");
            router = router.merge(module.router());
        }

        // Later layers wrap earlier ones, so execution order is:
        // trace → request id → logging tap → permission → routes.
        router
            .layer(middleware::from_fn_with_state(
                state.clone(),
                permission_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                log::request_log,
            ))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

async fn permission_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(status) = state.permission.check(req.method(), req.uri(), req.headers()) {
        tracing::warn!(
            method = %req.method(),
            path = req.uri().path(),
            status = %status,
            "request denied by permission filter"
        );
        return status.into_response();
    }
    next.run(req).await
}
