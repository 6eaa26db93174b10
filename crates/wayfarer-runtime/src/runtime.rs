//! Runtime orchestration.
//!
//! [`WayfarerRuntime`] owns a [`Dispatcher`] configured from
//! [`WayfarerConfig`] and runs every inbound message as its own tokio task.
//! Dispatches are unordered relative to each other; a failing or panicking
//! command only ends its own dispatch.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wayfarer_runtime::WayfarerRuntime;
//!
//! let runtime = WayfarerRuntime::builder()
//!     .config_file("wayfarer.toml")
//!     .build()?;
//!
//! runtime.register(Command::builder("ping").handler(ping).build())?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! // hand `tx` to the platform client
//! runtime.run(rx).await;
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use wayfarer_core::BoxedMessage;
use wayfarer_framework::{Command, DispatchOutcome, Dispatcher};

use crate::config::{ConfigLoader, WayfarerConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

struct RuntimeInner {
    config: WayfarerConfig,
    dispatcher: Dispatcher,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

/// Turns inbound messages into dispatch tasks.
///
/// Cloning is cheap; clones share the dispatcher and the shutdown state.
#[derive(Clone)]
pub struct WayfarerRuntime {
    inner: Arc<RuntimeInner>,
}

impl WayfarerRuntime {
    /// Creates a runtime builder that loads configuration from the current
    /// directory and the environment.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration and installs
    /// the logging it describes.
    pub fn from_config(config: &WayfarerConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        Self::with_config(config)
    }

    fn with_config(config: &WayfarerConfig) -> RuntimeResult<Self> {
        let dispatcher = Dispatcher::builder()
            .settings(config.dispatch.settings())
            .prefix(config.dispatch.prefixes()?)
            .build();

        info!(
            log_level = %config.logging.level,
            prefix = %config.dispatch.prefix,
            server_prefixes = config.dispatch.server_prefixes.len(),
            "Runtime initialized from configuration"
        );

        Ok(Self {
            inner: Arc::new(RuntimeInner {
                config: config.clone(),
                dispatcher,
                tracker: TaskTracker::new(),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    pub fn config(&self) -> &WayfarerConfig {
        &self.inner.config
    }

    /// The dispatcher, for interceptors and anything else beyond registration.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Registers a command with the dispatcher.
    pub fn register(&self, command: Command) -> RuntimeResult<Arc<Command>> {
        Ok(self.inner.dispatcher.register(command)?)
    }

    // ─── Dispatch ────────────────────────────────────────────────────────────

    /// Spawns a dispatch task for `event`.
    ///
    /// Fails with [`RuntimeError::ShutDown`] once shutdown was requested.
    pub fn submit(&self, event: BoxedMessage) -> RuntimeResult<JoinHandle<DispatchOutcome>> {
        if self.inner.shutdown.is_cancelled() {
            return Err(RuntimeError::ShutDown);
        }
        let dispatcher = self.inner.dispatcher.clone();
        Ok(self
            .inner
            .tracker
            .spawn(async move { dispatcher.dispatch(event).await }))
    }

    /// Number of dispatches still running.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Consumes `inbound` until it closes or shutdown is requested, then
    /// waits for the dispatches already running.
    pub async fn run_until(&self, mut inbound: mpsc::Receiver<BoxedMessage>) {
        info!("Wayfarer runtime is accepting messages");
        let shutdown = self.inner.shutdown.clone();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested, no longer receiving");
                    break;
                }
                message = inbound.recv() => match message {
                    Some(event) => {
                        if self.submit(event).is_err() {
                            break;
                        }
                    }
                    None => {
                        debug!("Inbound channel closed");
                        break;
                    }
                },
            }
        }

        self.drain().await;
    }

    /// Like [`run_until`](Self::run_until), additionally shutting down on
    /// Ctrl+C or SIGTERM.
    pub async fn run(&self, inbound: mpsc::Receiver<BoxedMessage>) {
        let shutdown = self.inner.shutdown.clone();
        let signals = tokio::spawn(async move {
            tokio::select! {
                _ = wait_for_signal() => shutdown.cancel(),
                _ = shutdown.cancelled() => {}
            }
        });

        self.run_until(inbound).await;
        signals.abort();
    }

    /// Requests shutdown. Running dispatches finish; new ones are refused.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// A token that is cancelled when the runtime shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    async fn drain(&self) {
        self.inner.shutdown.cancel();
        self.inner.tracker.close();
        let pending = self.inner.tracker.len();
        if pending > 0 {
            info!(pending, "Waiting for in-flight dispatches");
        }
        self.inner.tracker.wait().await;
        info!("Runtime stopped");
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                match signal::ctrl_c().await {
                    Ok(()) => info!("Received Ctrl+C, shutting down"),
                    Err(e) => {
                        warn!(error = %e, "Failed to listen for Ctrl+C");
                        std::future::pending::<()>().await;
                    }
                }
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`WayfarerRuntime`] with custom configuration sources.
///
/// ```rust,ignore
/// let runtime = WayfarerRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    init_logging: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            init_logging: true,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn merge(mut self, config: WayfarerConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Leaves the global subscriber alone, for hosts that install their own.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn build(self) -> RuntimeResult<WayfarerRuntime> {
        let config = self.config_loader.load()?;
        if self.init_logging {
            WayfarerRuntime::from_config(&config)
        } else {
            WayfarerRuntime::with_config(&config)
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
