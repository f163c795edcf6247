//! Lifecycle of the single MongoDB connection shared by the whole process.
//!
//! [ConnectionManager::connect] is called once at startup and either returns a
//! connected handle or an error the caller treats as fatal. The driver keeps the
//! link alive afterwards; this module only observes its health through the
//! [ConnectionHooks] table. [ConnectionManager::shutdown] releases the link at
//! most once, no matter how many exit paths call it.

use std::{
    collections::HashSet,
    future::Future,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use mongodb::{
    Client, Database,
    bson::doc,
    event::{EventHandler, sdam::SdamEvent},
    options::ClientOptions,
};
use tokio::sync::OnceCell;

use crate::Error;

/// How long the initial handshake may take to find a usable server.
pub const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(30);
/// How long an established but silent connection is kept in the pool.
pub const SOCKET_IDLE_TIMEOUT: Duration = Duration::from_secs(45);
/// The maximum number of pooled connections per server.
pub const MAX_POOL_SIZE: u32 = 10;
/// The database used when the connection string does not name one.
pub const DEFAULT_DATABASE_NAME: &str = "test";

/// The observable state of the link to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, either before [ConnectionManager::connect] or after a
    /// transient network fault.
    Disconnected,
    /// The initial handshake is in progress.
    Connecting,
    /// At least one server is reachable.
    Connected,
    /// [ConnectionManager::shutdown] is closing the client.
    Closing,
    /// The client has been closed for good.
    Terminated,
}

/// A change in the health of the link reported to the [ConnectionHooks].
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A server that was reachable stopped responding.
    Error(String),
    /// No server is reachable any more.
    Disconnected,
    /// A server became reachable again after a disconnect.
    Reconnected,
}

/// A passive observer of [ConnectionEvent]s.
pub type ConnectionHook = Box<dyn Fn(&ConnectionEvent) + Send + Sync>;

/// The observers registered when the connection is established.
///
/// Hooks run on the driver's monitoring task, so they must be quick. A hook
/// that panics is logged and otherwise ignored.
pub struct ConnectionHooks {
    /// Called when a reachable server stops responding.
    pub on_error: ConnectionHook,
    /// Called when the last reachable server is lost.
    pub on_disconnected: ConnectionHook,
    /// Called when a server is reachable again after a disconnect.
    pub on_reconnected: ConnectionHook,
}

impl Default for ConnectionHooks {
    fn default() -> Self {
        Self {
            on_error: Box::new(|event| {
                if let ConnectionEvent::Error(message) = event {
                    tracing::error!("MongoDB connection error: {message}");
                }
            }),
            on_disconnected: Box::new(|_| tracing::warn!("MongoDB disconnected")),
            on_reconnected: Box::new(|_| tracing::info!("MongoDB reconnected")),
        }
    }
}

impl ConnectionHooks {
    fn dispatch(&self, event: &ConnectionEvent) {
        let hook = match event {
            ConnectionEvent::Error(_) => &self.on_error,
            ConnectionEvent::Disconnected => &self.on_disconnected,
            ConnectionEvent::Reconnected => &self.on_reconnected,
        };

        if catch_unwind(AssertUnwindSafe(|| hook(event))).is_err() {
            tracing::error!("connection observer panicked while handling {event:?}");
        }
    }
}

#[derive(Debug)]
struct Link {
    state: ConnectionState,
    /// Addresses whose most recent heartbeat succeeded.
    reachable: HashSet<String>,
    /// Set once the initial handshake completes. Reconnects are only reported
    /// after this, so the initial connect is observed exactly once.
    connected_once: bool,
}

/// The driver-independent part of the connection: state, observers and the
/// one-shot close guard.
pub(crate) struct Lifecycle {
    link: Mutex<Link>,
    hooks: ConnectionHooks,
    closed: OnceCell<()>,
}

impl Lifecycle {
    pub(crate) fn new(hooks: ConnectionHooks) -> Self {
        Self {
            link: Mutex::new(Link {
                state: ConnectionState::Disconnected,
                reachable: HashSet::new(),
                connected_once: false,
            }),
            hooks,
            closed: OnceCell::new(),
        }
    }

    fn link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.link().state
    }

    fn set_state(&self, state: ConnectionState) {
        self.link().state = state;
    }

    /// Move from `Connecting` to `Connected`.
    ///
    /// Returns false if the lifecycle was not connecting, e.g. on a second call.
    pub(crate) fn mark_connected(&self) -> bool {
        let mut link = self.link();

        if link.state != ConnectionState::Connecting {
            return false;
        }

        link.state = ConnectionState::Connected;
        link.connected_once = true;
        true
    }

    pub(crate) fn server_reachable(&self, address: String) {
        let event = {
            let mut link = self.link();
            let was_unreachable = link.reachable.is_empty();
            link.reachable.insert(address);

            if was_unreachable && link.connected_once && link.state == ConnectionState::Disconnected
            {
                link.state = ConnectionState::Connected;
                Some(ConnectionEvent::Reconnected)
            } else {
                None
            }
        };

        if let Some(event) = event {
            self.hooks.dispatch(&event);
        }
    }

    pub(crate) fn server_unreachable(&self, address: &str, failure: String) {
        let events = {
            let mut link = self.link();

            if !link.reachable.remove(address) || link.state != ConnectionState::Connected {
                Vec::new()
            } else if link.reachable.is_empty() {
                link.state = ConnectionState::Disconnected;
                vec![
                    ConnectionEvent::Error(failure),
                    ConnectionEvent::Disconnected,
                ]
            } else {
                vec![ConnectionEvent::Error(failure)]
            }
        };

        for event in &events {
            self.hooks.dispatch(event);
        }
    }

    /// Run `close` the first time this is called and never again.
    ///
    /// Later or concurrent callers wait for the first close to finish. Returns
    /// true for the caller whose `close` ran.
    pub(crate) async fn close_once<F, Fut>(&self, close: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut closed_here = false;

        self.closed
            .get_or_init(|| {
                closed_here = true;
                self.set_state(ConnectionState::Closing);
                close()
            })
            .await;

        if closed_here {
            self.set_state(ConnectionState::Terminated);
        }

        closed_here
    }
}

/// Check that a connection string was provided.
///
/// # Errors
/// Returns [Error::Configuration] if `uri` is absent or blank.
pub fn require_uri(uri: Option<&str>) -> Result<&str, Error> {
    uri.map(str::trim)
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| {
            Error::Configuration("MONGODB_URI environment variable is not defined".to_owned())
        })
}

/// Apply the pool and timeout limits to parsed client options.
///
/// These take precedence over any equivalent options in the connection string.
pub fn apply_limits(options: &mut ClientOptions) {
    options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
    options.max_idle_time = Some(SOCKET_IDLE_TIMEOUT);
    options.max_pool_size = Some(MAX_POOL_SIZE);
}

fn observe_topology(lifecycle: &Lifecycle, event: SdamEvent) {
    match event {
        SdamEvent::ServerHeartbeatSucceeded(event) => {
            lifecycle.server_reachable(event.server_address.to_string());
        }
        SdamEvent::ServerHeartbeatFailed(event) => {
            lifecycle
                .server_unreachable(&event.server_address.to_string(), event.failure.to_string());
        }
        _ => {}
    }
}

/// Owns the process-wide database client.
///
/// Cloning is cheap and every clone refers to the same client and lifecycle.
#[derive(Clone)]
pub struct ConnectionManager {
    client: Client,
    database: Database,
    lifecycle: Arc<Lifecycle>,
}

impl ConnectionManager {
    /// Connect to the database at `uri` and register `hooks`.
    ///
    /// Waits until a server answers a ping, bounded by
    /// [SERVER_SELECTION_TIMEOUT].
    ///
    /// # Errors
    /// Returns [Error::Configuration] if `uri` is absent, blank or malformed,
    /// and [Error::Connectivity] if no server could be reached. Callers should
    /// treat either as fatal.
    pub async fn connect(uri: Option<&str>, hooks: ConnectionHooks) -> Result<Self, Error> {
        let uri = require_uri(uri)?;
        let lifecycle = Arc::new(Lifecycle::new(hooks));
        lifecycle.set_state(ConnectionState::Connecting);

        let mut options = ClientOptions::parse(uri).await.inspect_err(|_| {
            lifecycle.set_state(ConnectionState::Disconnected);
        })?;
        apply_limits(&mut options);

        let observer = Arc::clone(&lifecycle);
        options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| {
            observe_topology(&observer, event)
        }));

        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE_NAME));

        if let Err(error) = database.run_command(doc! { "ping": 1 }).await {
            lifecycle.set_state(ConnectionState::Disconnected);
            client.shutdown().immediate(true).await;
            return Err(error.into());
        }

        lifecycle.mark_connected();
        tracing::info!("MongoDB connected successfully");
        tracing::info!("Database: {}", database.name());

        Ok(Self {
            client,
            database,
            lifecycle,
        })
    }

    /// The database named by the connection string.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The current state of the link.
    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    /// Close the client, releasing pooled connections and monitors.
    ///
    /// Safe to call from every exit path: only the first call closes the
    /// client, later calls wait for it and return false.
    pub async fn shutdown(&self) -> bool {
        let client = self.client.clone();
        let closed = self
            .lifecycle
            .close_once(|| async move {
                client.shutdown().immediate(true).await;
            })
            .await;

        if closed {
            tracing::info!("MongoDB connection closed through app termination");
        }

        closed
    }
}

/// Log a fatal connection failure with a hint about the likely cause.
pub fn log_connection_failure(error: &Error) {
    match error {
        Error::Configuration(message) => {
            tracing::error!("Configuration error: {message}");
        }
        Error::Connectivity(_) => {
            tracing::error!("MongoDB connection failed: {error}");
            tracing::error!("Make sure MongoDB is running and the connection string is correct");
        }
        _ => tracing::error!("MongoDB connection failed: {error}"),
    }
}
