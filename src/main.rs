use anyhow::Result;
use clap::{Parser, Subcommand};
use draftd::{
    completion::openai::OpenAiCompletionSource, config::DaemonConfig, storage::seed,
    storage::Storage, AppContext,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "draftd",
    about = "draftd — document version history + streaming AI review daemon",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Review WebSocket server port (REST API binds port + 1)
    #[arg(long, env = "DRAFTD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "DRAFTD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DRAFTD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "DRAFTD_BIND")]
    bind_address: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon (default when no subcommand given).
    Serve,
    /// Wipe all documents and versions and re-insert the sample documents.
    Seed,
}

fn init_tracing(config: &DaemonConfig) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::new(config.log.clone());
    if config.log_format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Arc::new(DaemonConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
    ));
    init_tracing(&config);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(config).await,
        Command::Seed => run_seed(config).await,
    }
}

async fn run_seed(config: Arc<DaemonConfig>) -> Result<()> {
    let storage = Storage::new(&config.data_dir).await?;
    seed::reseed(&storage).await?;
    Ok(())
}

async fn run_server(config: Arc<DaemonConfig>) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "draftd starting");
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        rest_port = config.rest_port(),
        "config loaded"
    );

    let storage = Arc::new(
        Storage::new_with_slow_query(
            &config.data_dir,
            config.observability.slow_query_threshold_ms,
        )
        .await?,
    );
    seed::seed_if_empty(&storage).await?;

    if config.completion.api_key.is_empty() {
        warn!("no completion API key configured — review rounds will fail until the provider accepts anonymous requests");
    }
    let completions = Arc::new(OpenAiCompletionSource::new(&config.completion)?);

    let ctx = AppContext::new(config, storage, completions);

    // REST runs beside the review server; if it ever exits, that's a bug
    // worth surfacing, but the review channel keeps serving.
    let rest_ctx = ctx.clone();
    tokio::spawn(async move {
        if let Err(e) = draftd::rest::start_rest_server(rest_ctx).await {
            tracing::error!(err = %e, "REST server exited");
        }
    });

    draftd::ws::run(ctx).await
}
