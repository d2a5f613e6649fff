pub mod completion;
pub mod config;
pub mod rest;
pub mod review;
pub mod storage;
pub mod ws;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use completion::CompletionSource;
use config::DaemonConfig;
use storage::Storage;

/// Shared application state passed to every route handler and review session.
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub storage: Arc<Storage>,
    /// The completion provider. A trait object so tests can substitute a
    /// scripted source for the real streaming HTTP client.
    pub completions: Arc<dyn CompletionSource>,
    pub started_at: std::time::Instant,
    /// Gauge of currently open review channels, reported by GET /health.
    pub active_sessions: AtomicUsize,
}

impl AppContext {
    pub fn new(
        config: Arc<DaemonConfig>,
        storage: Arc<Storage>,
        completions: Arc<dyn CompletionSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            storage,
            completions,
            started_at: std::time::Instant::now(),
            active_sessions: AtomicUsize::new(0),
        })
    }
}
