mod config;
mod connection;
mod logging;
mod record;
mod server;
mod sink;

use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

const RECORD_QUEUE_CAPACITY: usize = 1000;

#[derive(Parser, Debug)]
#[command(name = "avl-server", about = "Teltonika Codec 8 ingestion server")]
struct Args {
    /// Path to the YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: String,
    /// Override tcp.url
    #[arg(long)]
    listen: Option<String>,
    /// Override the worker pool size
    #[arg(long)]
    workers: Option<usize>,
    /// Override logging.level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut cfg = config::load_config(&args.config).await;

    if let Some(listen) = args.listen {
        cfg.tcp.url = listen;
    }
    if let Some(workers) = args.workers {
        cfg.workers = workers;
    }
    if let Some(level) = args.log_level {
        cfg.logging.level = level;
    }

    let _log_guard = logging::init(&cfg.logging.level, &cfg.logging.directory);
    info!(
        "avl-server v{} starting — listen={}, workers={}, sink={}",
        env!("CARGO_PKG_VERSION"),
        cfg.tcp.url,
        cfg.workers,
        cfg.sink.kind
    );

    let (record_tx, record_rx) = mpsc::channel(RECORD_QUEUE_CAPACITY);
    let sink = sink::build_sink(&cfg.sink.kind);
    tokio::spawn(sink::run_sink(sink, record_rx));

    server::run(
        &cfg.tcp.url,
        cfg.workers,
        Duration::from_secs(cfg.read_timeout_secs),
        cfg.sink.timezone.clone(),
        record_tx,
    )
    .await
}
