mod app;
mod cache;
mod config;
mod consumer;
mod context;
mod grpc;
mod handlers;
mod queue;
mod services;
mod state;
mod storage;
mod webhook;

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use listenfd::ListenFd;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::create_app;
use crate::config::Config;
use crate::grpc::GuestGrpc;
use crate::state::AppState;
use crate::storage::SqliteDatabase;

/// Guestbook - guest records over HTTP, gRPC and an event consumer
#[derive(Parser, Debug)]
#[command(name = "guestbook")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Http,
    /// Run the gRPC API
    Grpc,
    /// Run the guest event consumer
    Consumer,
    /// Run the HTTP API, the gRPC API and the consumer in one process
    Serve,
    /// Create the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = Config::from_env();

    if let Command::Migrate = cli.command {
        return migrate(&config).await;
    }

    let state = AppState::new(config).await?;
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let signals = {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(());
        })
    };

    match cli.command {
        Command::Http => serve_http(state, wait(&shutdown_tx)).await?,
        Command::Grpc => serve_grpc(state, wait(&shutdown_tx)).await?,
        Command::Consumer => {
            drain_consumers(consumer::spawn_consumers(&state, &shutdown_tx)).await;
        }
        Command::Serve => {
            // Workers subscribe to the shutdown before any transport can fail.
            let consumers = consumer::spawn_consumers(&state, &shutdown_tx);
            let (http, grpc, ()) = tokio::join!(
                stop_on_error(serve_http(state.clone(), wait(&shutdown_tx)), &shutdown_tx),
                stop_on_error(serve_grpc(state, wait(&shutdown_tx)), &shutdown_tx),
                drain_consumers(consumers),
            );
            http?;
            grpc?;
        }
        Command::Migrate => {}
    }

    signals.abort();
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "guestbook=debug,guestbook_core=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if format == LogFormat::Json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn migrate(config: &Config) -> Result<()> {
    let db = SqliteDatabase::connect(&config.database).await?;
    db.migrate().await?;
    tracing::info!("Migrations applied");
    Ok(())
}

async fn serve_http(state: AppState, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let timeout = state.config.server.http_request_timeout();
    let addr = format!(
        "{}:{}",
        state.config.server.http_host, state.config.server.http_port
    );
    let app = create_app(state, timeout);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        None => TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind HTTP listener on {addr}"))?,
    };

    tracing::info!("HTTP listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn serve_grpc(state: AppState, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.server.http_host, state.config.server.grpc_port
    )
    .parse()
    .context("invalid gRPC listen address")?;

    tracing::info!("gRPC listening on {addr}");

    tonic::transport::Server::builder()
        .timeout(state.config.server.grpc_request_timeout())
        .layer(TraceLayer::new_for_grpc())
        .layer(CatchPanicLayer::custom(grpc::panic_status))
        .add_service(GuestGrpc::new(state.guests.clone()).into_server())
        .serve_with_shutdown(addr, shutdown)
        .await?;

    tracing::info!("gRPC server stopped");
    Ok(())
}

async fn drain_consumers(mut workers: JoinSet<()>) {
    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "Consumer task failed");
        }
    }
}

/// Broadcasts a shutdown when `task` fails so the other transports stop too.
async fn stop_on_error<F>(task: F, shutdown: &broadcast::Sender<()>) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let result = task.await;
    if let Err(err) = &result {
        tracing::error!(error = %err, "Transport failed, shutting down");
        let _ = shutdown.send(());
    }
    result
}

/// Resolves once a shutdown has been broadcast.
fn wait(shutdown: &broadcast::Sender<()>) -> impl Future<Output = ()> + Send + 'static {
    let mut rx = shutdown.subscribe();
    async move {
        let _ = rx.recv().await;
    }
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
