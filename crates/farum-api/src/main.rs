//! Farum CLI and REST API entry point.
//!
//! Binary name: `farum`
//!
//! Parses CLI arguments, loads configuration, initializes storage and the
//! reply pipeline, then dispatches to the appropriate command handler or
//! starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use farum_infra::config::{data_dir, load_config};
use farum_observe::{LogFormat, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = data_dir();
    let mut config = load_config(&data_dir).await;

    // Set up tracing based on verbosity; the server logs progress by default
    let serving = matches!(cli.command, Commands::Serve { .. });
    let filter = match cli.verbose {
        0 if serving => "info",
        0 => "warn",
        1 => "info,farum_core=debug,farum_infra=debug,farum_api=debug",
        _ => "trace",
    };
    init_tracing(cli.otel, LogFormat::from_json_flag(config.log_json), filter)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    if let Commands::Serve { port, host } = &cli.command {
        if let Some(port) = port {
            config.port = *port;
        }
        if let Some(host) = host {
            config.host = host.clone();
        }
    }

    // Initialize application state (storage, provider, services)
    let state = AppState::init(config, data_dir).await?;

    let result = match cli.command {
        Commands::Serve { .. } => serve(state.clone()).await,
        Commands::Session { action } => cli::session::run(&state, action, cli.json).await,
        Commands::Journal { user, limit } => {
            cli::journal::show_journal(&state, user, limit, cli.json).await
        }
        Commands::Demo { user, text } => cli::demo::run_demo(&state, user, &text, cli.json).await,
    };

    state.shutdown().await;
    shutdown_tracing();
    result
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    spawn_event_logger(&state);
    info!(
        addr = %addr,
        mode = %state.config.mode,
        storage = %state.config.storage_backend,
        provider = %state.config.llm.provider,
        data_dir = %state.data_dir.display(),
        "farum api listening"
    );

    println!(
        "  {} Farum API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Mirror pipeline events into the log so stage timings and journal
/// failures show up next to the request that caused them.
fn spawn_event_logger(state: &AppState) {
    let mut rx = state.events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(session_id = %event.session_id(), event = ?event, "pipeline event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
