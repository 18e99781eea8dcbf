//! Server lifecycle manager.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::cache::{self, CacheWatcher};
use crate::config::{ConfigStore, ServerOptions, Settings};
use crate::lifecycle::events::{Event, EventBus};
use crate::routes::{AllowAll, AppState, PermissionFilter, RouteRegistry};

/// Errors surfaced by `start` and `restart`. `close` never fails.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The cache directory could not be created. Raised before any
    /// network resource is touched.
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The filesystem watch on the cache directory could not be armed.
    #[error("failed to watch cache directory {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },

    /// The listener could not bind, typically because the port is in
    /// use or requires privileges.
    #[error("failed to bind port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    /// `start` was called while the listener was already bound.
    /// Double-start is rejected rather than treated as a no-op; call
    /// `restart` to rebind with new options.
    #[error("server is already running on port {port}")]
    AlreadyRunning { port: u16 },
}

enum State {
    Stopped,
    Running(Running),
}

/// Resources owned while the listener is bound.
struct Running {
    settings: Settings,
    local_addr: SocketAddr,
    /// Keeps the cache watch armed; dropping it disarms.
    watcher: RecommendedWatcher,
    shutdown_tx: oneshot::Sender<()>,
    serve_task: JoinHandle<()>,
}

struct ServerInner {
    config: ConfigStore,
    events: EventBus,
    registry: RouteRegistry,
    permission: Arc<dyn PermissionFilter>,
    /// Cloned into every armed watcher; the receiving end feeds the
    /// change loop spawned at construction.
    change_tx: mpsc::UnboundedSender<PathBuf>,
    state: Mutex<State>,
}

/// The server lifecycle manager.
///
/// Owns the process configuration, the HTTP listener, and the cache
/// directory watch. At most one listener is bound at any time; `start`,
/// `close` and `restart` serialize on an internal lock, so a
/// watcher-triggered restart queues behind any operation already in
/// flight.
///
/// Cheap to clone; all clones drive the same underlying server. Must be
/// created inside a Tokio runtime.
#[derive(Clone)]
pub struct Server {
    inner: Arc<ServerInner>,
}

impl Server {
    /// Create a stopped server with no external route modules and an
    /// allow-all permission filter.
    pub fn new(options: ServerOptions) -> Self {
        Self::with_routes(options, RouteRegistry::new(), Arc::new(AllowAll))
    }

    /// Create a stopped server with externally supplied route modules
    /// and permission filter.
    pub fn with_routes(
        options: ServerOptions,
        registry: RouteRegistry,
        permission: Arc<dyn PermissionFilter>,
    ) -> Self {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        let config = ConfigStore::new();
        config.apply(&options);

        let server = Self {
            inner: Arc::new(ServerInner {
                config,
                events: EventBus::new(),
                registry,
                permission,
                change_tx,
                state: Mutex::new(State::Stopped),
            }),
        };
        server.spawn_change_loop(change_rx);
        server
    }

    /// Subscribe to lifecycle events emitted from this point on.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    /// The shared configuration handle.
    pub fn config(&self) -> &ConfigStore {
        &self.inner.config
    }

    /// Whether the listener is currently bound.
    pub async fn is_running(&self) -> bool {
        matches!(&*self.inner.state.lock().await, State::Running(_))
    }

    /// Address the listener is bound to, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.inner.state.lock().await {
            State::Running(running) => Some(running.local_addr),
            State::Stopped => None,
        }
    }

    /// Start the server: merge options into the configuration, create
    /// the cache directory, arm the cache watch, bind the listener and
    /// emit [`Event::Start`].
    ///
    /// Fails without emitting an event if the cache directory cannot be
    /// created or the port cannot be bound; the server stays stopped
    /// and remains usable. Calling `start` while already running is
    /// rejected with [`ServerError::AlreadyRunning`].
    pub async fn start(&self, options: ServerOptions) -> Result<Settings, ServerError> {
        let mut state = self.inner.state.lock().await;
        if let State::Running(running) = &*state {
            return Err(ServerError::AlreadyRunning {
                port: running.settings.port,
            });
        }
        self.do_start(&mut state, options).await
    }

    /// Shut the server down.
    ///
    /// Stops accepting new connections, lets in-flight connections
    /// drain, disarms the cache watch and emits [`Event::End`]. A close
    /// on a stopped server is a no-op; close never fails, so it is
    /// always safe to call again.
    pub async fn close(&self) {
        let mut state = self.inner.state.lock().await;
        self.do_close(&mut state).await;
    }

    /// Restart the server: a full close followed by a start with the
    /// given options, as one atomic sequence. The new start begins only
    /// after the old listener has fully released its port.
    pub async fn restart(&self, options: ServerOptions) -> Result<Settings, ServerError> {
        let mut state = self.inner.state.lock().await;
        self.do_close(&mut state).await;
        self.do_start(&mut state, options).await
    }

    /// One restart cycle triggered by a cache directory change, using
    /// the previously active options. Ignored when the server already
    /// stopped (a late notification from a disarmed watch).
    async fn restart_on_change(&self) {
        let mut state = self.inner.state.lock().await;
        let State::Running(running) = &*state else {
            return;
        };
        let options = running.settings.to_options();

        tracing::info!(
            cache = %running.settings.cache.display(),
            "cache directory changed, restarting server"
        );
        self.do_close(&mut state).await;
        if let Err(error) = self.do_start(&mut state, options).await {
            tracing::error!(%error, "restart after cache change failed");
        }
    }

    fn spawn_change_loop(&self, mut change_rx: mpsc::UnboundedReceiver<PathBuf>) {
        let weak: Weak<ServerInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while change_rx.recv().await.is_some() {
                let Some(inner) = weak.upgrade() else { break };
                Server { inner }.restart_on_change().await;
            }
        });
    }

    /// Caller must hold the state lock and have verified the server is
    /// stopped.
    async fn do_start(
        &self,
        state: &mut State,
        options: ServerOptions,
    ) -> Result<Settings, ServerError> {
        let settings = self.inner.config.apply(&options);

        cache::ensure_dir(&settings.cache).map_err(|source| ServerError::CacheDir {
            path: settings.cache.clone(),
            source,
        })?;

        let watcher = CacheWatcher::new(&settings.cache, self.inner.change_tx.clone())
            .run()
            .map_err(|source| ServerError::Watch {
                path: settings.cache.clone(),
                source,
            })?;

        let listener = TcpListener::bind(("0.0.0.0", settings.port))
            .await
            .map_err(|source| ServerError::Bind {
                port: settings.port,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            port: settings.port,
            source,
        })?;

        let app_state = AppState {
            config: self.inner.config.clone(),
            events: self.inner.events.clone(),
            permission: self.inner.permission.clone(),
        };
        let app = self.inner.registry.build(app_state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let serve_task = tokio::spawn(async move {
            let service = app.into_make_service_with_connect_info::<SocketAddr>();
            let result = axum::serve(listener, service)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(error) = result {
                tracing::error!(%error, "http server terminated");
            }
        });

        tracing::info!(
            address = %local_addr,
            cache = %settings.cache.display(),
            "server started"
        );
        self.inner.events.emit(Event::Start(settings.clone()));

        *state = State::Running(Running {
            settings: settings.clone(),
            local_addr,
            watcher,
            shutdown_tx,
            serve_task,
        });
        Ok(settings)
    }

    /// Caller must hold the state lock. Never fails; shutdown errors
    /// are logged and swallowed so repeated closes stay safe.
    async fn do_close(&self, state: &mut State) {
        let State::Running(running) = std::mem::replace(state, State::Stopped) else {
            return;
        };
        let Running {
            settings,
            watcher,
            shutdown_tx,
            serve_task,
            ..
        } = running;

        // Disarm the cache watch before the listener goes away so a
        // change during shutdown cannot queue another restart.
        drop(watcher);

        let _ = shutdown_tx.send(());
        if let Err(error) = serve_task.await {
            tracing::warn!(%error, "serve task did not shut down cleanly");
        }

        tracing::info!(port = settings.port, "server stopped");
        self.inner.events.emit(Event::End);
    }
}
