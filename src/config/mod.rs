use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4700;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── CompletionConfig ─────────────────────────────────────────────────────────

/// Completion provider configuration (`[completion]` in config.toml).
///
/// The provider is any OpenAI-compatible streaming chat-completions endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Provider base URL, without the `/chat/completions` suffix.
    pub api_base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Bearer token. Falls back to the DRAFTD_COMPLETION_API_KEY env var.
    /// Empty = no Authorization header (local providers).
    pub api_key: String,
    /// Whole-request timeout in seconds. A stream that stays open longer than
    /// this is treated as a transport failure.
    pub request_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            request_timeout_secs: 120,
        }
    }
}

// ─── ObservabilityConfig ─────────────────────────────────────────────────────

/// Daemon observability configuration (`[observability]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log SQLite queries that exceed this threshold (milliseconds). Default: 100.
    /// Set to 0 to disable slow query logging.
    pub slow_query_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 100,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Review WebSocket port (default: 4700). The REST API binds port + 1.
    port: Option<u16>,
    /// Log level filter string, e.g. "debug", "info,draftd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json".
    log_format: Option<String>,
    /// Bind address for both servers (default: "127.0.0.1").
    bind_address: Option<String>,
    /// Origin allowed to call the REST API from a browser.
    cors_origin: Option<String>,
    /// Completion provider configuration (`[completion]`).
    completion: Option<CompletionConfig>,
    /// Observability configuration (`[observability]`).
    observability: Option<ObservabilityConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── DaemonConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Review WebSocket port. The REST API listens on `port + 1`.
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Log output format: "pretty" (default) | "json".
    pub log_format: String,
    /// Bind address for the WebSocket and REST servers (DRAFTD_BIND env var).
    pub bind_address: String,
    /// Browser origin allowed by the REST CORS layer.
    pub cors_origin: String,
    /// Completion provider: base URL, model, key, timeout.
    pub completion: CompletionConfig,
    /// Observability: slow query threshold.
    pub observability: ObservabilityConfig,
}

impl DaemonConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let toml = load_toml(&data_dir).unwrap_or_default();

        let mut completion = toml.completion.unwrap_or_default();
        if completion.api_key.is_empty() {
            if let Ok(key) = std::env::var("DRAFTD_COMPLETION_API_KEY") {
                completion.api_key = key;
            }
        }

        Self {
            port: port.or(toml.port).unwrap_or(DEFAULT_PORT),
            log: log.or(toml.log).unwrap_or_else(|| "info".to_string()),
            log_format: toml.log_format.unwrap_or_else(|| "pretty".to_string()),
            bind_address: bind_address
                .or(toml.bind_address)
                .unwrap_or_else(default_bind_address),
            cors_origin: toml
                .cors_origin
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            completion,
            observability: toml.observability.unwrap_or_default(),
            data_dir,
        }
    }

    /// Port the REST document/version API binds to.
    pub fn rest_port(&self) -> u16 {
        self.port + 1
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".draftd")
    } else {
        PathBuf::from(".draftd")
    }
}
