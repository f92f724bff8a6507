use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use procvisor::gateway::{Admission, Gateway};
use procvisor::{ConfigError, LogWriter, Subscribe, Supervisor, SupervisorConfig, WorkerCommand};

/// Built-in secret used when `SECRET_KEY` is not set. Override it in real deployments.
const DEFAULT_SECRET: &str = "HomeAssistant";

/// Supervise one worker process behind a WebSocket control channel.
#[derive(Parser, Debug)]
#[command(name = "procvisor", version, about)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "BIND", default_value = "0.0.0.0")]
    bind: std::net::IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8789)]
    port: u16,

    /// Shared secret clients must present; empty disables authentication.
    #[arg(long, env = "SECRET_KEY", default_value = DEFAULT_SECRET, hide_env_values = true)]
    secret: String,

    /// Worker command line, split on whitespace.
    #[arg(long = "worker-cmd", env = "WORKER_CMD", default_value = "./worker")]
    worker_cmd: String,

    /// Milliseconds between SIGTERM and SIGKILL on stop.
    #[arg(long = "grace-ms", env = "GRACE_MS", default_value_t = 250)]
    grace_ms: u64,

    /// Events buffered per connection before a slow client is disconnected.
    #[arg(long = "queue-capacity", env = "QUEUE_CAPACITY", default_value_t = 1024)]
    queue_capacity: usize,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging();

    let admission = Admission::new(&cli.secret);
    if admission.is_open() {
        tracing::warn!("SECRET_KEY is empty: the server is running without authentication");
    } else if cli.secret == DEFAULT_SECRET {
        tracing::warn!("SECRET_KEY is not set: using the built-in default secret");
    }

    let command: WorkerCommand = cli.worker_cmd.parse().map_err(|err: ConfigError| {
        tracing::error!(
            label = err.as_label(),
            worker_cmd = %cli.worker_cmd,
            "invalid worker command: {}",
            err.as_message()
        );
        err
    })?;
    let cfg = SupervisorConfig::new(command)
        .with_grace(Duration::from_millis(cli.grace_ms))
        .with_queue_capacity(cli.queue_capacity);
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let supervisor = Supervisor::builder(cfg).with_subscribers(subscribers).build();

    let addr = SocketAddr::new(cli.bind, cli.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("WebSocket server started on ws://{addr}");

    let shutdown = async {
        if let Err(err) = procvisor::wait_for_shutdown_signal().await {
            tracing::error!(error = %err, "cannot listen for shutdown signals");
            std::future::pending::<()>().await;
        }
    };
    Gateway::new(supervisor.clone(), admission)
        .serve(listener, shutdown)
        .await
        .context("gateway failed")?;

    tracing::info!("shutting down; stopping worker");
    supervisor.shutdown().await.ok();
    Ok(())
}
