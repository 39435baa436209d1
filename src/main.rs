use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sched_engine::TaskService;
use sched_server::config::{parse_usize_range, MAX_LIST_LIMIT, MIN_LIST_LIMIT};
use sched_server::ServerConfig;
use sched_store::Database;
use sched_telemetry::TelemetryConfig;
use tracing::Level;

/// Single-user task scheduler with an HTTP API.
///
/// Flags override `TODO_*` environment variables, which override defaults.
#[derive(Debug, Parser)]
#[command(name = "sched", version)]
struct Cli {
    /// Address to bind.
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,
    /// SQLite database file.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Directory of static front-end files.
    #[arg(long)]
    web_dir: Option<PathBuf>,
    /// Maximum tasks returned by a listing.
    #[arg(long, value_parser = parse_list_limit)]
    list_limit: Option<usize>,
    /// Log as JSON lines.
    #[arg(long)]
    log_json: bool,
    /// Default log level; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn parse_list_limit(raw: &str) -> Result<usize, String> {
    parse_usize_range(raw, MIN_LIST_LIMIT, MAX_LIST_LIMIT)
        .ok_or_else(|| format!("expected an integer in {MIN_LIST_LIMIT}..={MAX_LIST_LIMIT}"))
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(dir) = self.web_dir {
            config.web_dir = dir;
        }
        if let Some(limit) = self.list_limit {
            config.list_limit = limit;
        }
        config.log_json |= self.log_json;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level;
    let config = cli.into_config();

    sched_telemetry::init_telemetry(&TelemetryConfig {
        log_level,
        json: config.log_json,
        ..TelemetryConfig::default()
    })?;

    tracing::info!("starting scheduler");

    let db = Database::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;

    let service = TaskService::new(db).with_list_limit(config.list_limit);
    let handle = sched_server::start(&config, service)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    tracing::info!(port = handle.port, "scheduler ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;

    tracing::info!("shutting down");
    handle.abort();
    Ok(())
}
