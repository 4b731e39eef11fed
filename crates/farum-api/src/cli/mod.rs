//! CLI command definitions and dispatch for the `farum` binary.
//!
//! Uses clap derive macros for argument parsing. Session commands follow a
//! noun-verb pattern (e.g., `farum session start`, `farum session send`).

pub mod demo;
pub mod journal;
pub mod session;

use clap::{Parser, Subcommand};

/// A companion that listens, plans and reflects with you.
#[derive(Parser)]
#[command(name = "farum", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export trace spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to the configured port).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to the configured host).
        #[arg(long)]
        host: Option<String>,
    },

    /// Start, continue and inspect conversations.
    Session {
        #[command(subcommand)]
        action: session::SessionCommand,
    },

    /// Show a user's journal.
    Journal {
        /// User whose journal to show.
        #[arg(long)]
        user: String,

        /// Number of most recent entries (default 20).
        #[arg(long, default_value = "0")]
        limit: i64,
    },

    /// Start a session and run one exchange end to end.
    Demo {
        /// User id for the demo session.
        #[arg(long, default_value = "demo-user")]
        user: String,

        /// Message to send.
        #[arg(default_value = "I've been feeling overwhelmed with my coursework lately.")]
        text: String,
    },
}
