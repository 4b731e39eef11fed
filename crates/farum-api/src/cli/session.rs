//! Session CLI commands: start, send, show, list.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use farum_types::config::StorageBackend;
use farum_types::message::{Message, Role};
use farum_types::session::{InteractionMode, SessionId, UserId};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a new session and print the welcome message.
    Start {
        /// User who owns the session.
        #[arg(long)]
        user: String,

        /// check_in, deep_dive or action_plan (short forms accepted).
        #[arg(long, default_value = "check_in")]
        mode: String,

        /// Optional session title.
        #[arg(long, default_value = "")]
        title: String,
    },

    /// Send a message and print the companion's reply.
    Send {
        /// Session id.
        id: String,

        /// User sending the message.
        #[arg(long)]
        user: String,

        /// Message text.
        text: String,
    },

    /// Show a session and its timeline.
    Show {
        /// Session id.
        id: String,

        /// Only the most recent N messages (0 = all).
        #[arg(long, default_value = "0")]
        limit: i64,
    },

    /// List a user's sessions, newest first.
    #[command(alias = "ls")]
    List {
        /// User whose sessions to list.
        #[arg(long)]
        user: String,

        /// Maximum number of sessions (0 = all).
        #[arg(long, default_value = "0")]
        limit: i64,
    },
}

pub async fn run(state: &AppState, command: SessionCommand, json: bool) -> Result<()> {
    match command {
        SessionCommand::Start { user, mode, title } => start(state, user, &mode, title, json).await,
        SessionCommand::Send { id, user, text } => send(state, &id, user, &text, json).await,
        SessionCommand::Show { id, limit } => show(state, &id, limit, json).await,
        SessionCommand::List { user, limit } => list(state, user, limit, json).await,
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId> {
    raw.parse::<SessionId>()
        .with_context(|| format!("'{raw}' is not a valid session id"))
}

/// Start a session.
///
/// # Examples
///
/// ```bash
/// farum session start --user ana --mode deep --title "Exam stress"
/// ```
pub async fn start(
    state: &AppState,
    user: String,
    mode: &str,
    title: String,
    json: bool,
) -> Result<()> {
    let ctx = state.request_context();
    let mode = InteractionMode::parse_lenient(mode);
    let output = state
        .conversation
        .open_session(&ctx, UserId::new(user), mode, title)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }
    let session = &output.session;

    println!();
    println!("  {} Session started", style("✓").green().bold());
    println!();
    println!("  {}     {}", style("ID:").bold(), style(session.id.to_string()).cyan());
    println!("  {}   {}", style("Mode:").bold(), session.preferred_mode);
    if !session.title.is_empty() {
        println!("  {}  {}", style("Title:").bold(), session.title);
    }
    println!();
    print_message(&output.welcome_message);
    println!();
    if state.config.storage_backend == StorageBackend::Memory {
        println!(
            "  {}",
            style("Storage is in-memory; set storage_backend = \"sqlite\" to continue this session later.")
                .dim()
        );
        println!();
    }
    Ok(())
}

/// Send one message and print both turns.
///
/// # Examples
///
/// ```bash
/// farum session send 0190b5a4-... --user ana "I can't focus today"
/// ```
pub async fn send(state: &AppState, id: &str, user: String, text: &str, json: bool) -> Result<()> {
    let sid = parse_session_id(id)?;
    let ctx = state.request_context();
    let output = state
        .conversation
        .send_message(&ctx, &sid, &UserId::new(user), text)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    print_message(&output.user_message);
    print_message(&output.agent_message);
    println!();
    Ok(())
}

/// Print a session header followed by its messages, oldest first.
pub async fn show(state: &AppState, id: &str, limit: i64, json: bool) -> Result<()> {
    let sid = parse_session_id(id)?;
    let ctx = state.request_context();
    let timeline = state
        .conversation
        .get_session_timeline(&ctx, &sid, limit)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
        return Ok(());
    }

    let session = &timeline.session;
    println!();
    println!(
        "  {} {}",
        style("Session").bold(),
        style(session.id.to_string()).cyan()
    );
    println!(
        "  {}",
        style(format!(
            "user {} · {} · started {}",
            session.user_id,
            session.preferred_mode,
            session.created_at.format("%Y-%m-%d %H:%M")
        ))
        .dim()
    );
    println!();
    for message in &timeline.messages {
        print_message(message);
    }
    if timeline.has_dangling_user_turn() {
        println!();
        println!(
            "  {} The last message never got a reply.",
            style("!").yellow().bold()
        );
    }
    println!();
    Ok(())
}

/// List a user's sessions as a table.
pub async fn list(state: &AppState, user: String, limit: i64, json: bool) -> Result<()> {
    let ctx = state.request_context();
    let user = UserId::new(user);
    let sessions = state.conversation.list_sessions(&ctx, &user, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions found for '{}'. Start one with: {}",
            style("i").blue().bold(),
            style(&user).cyan(),
            style(format!("farum session start --user {user}")).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Mode").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
    ]);

    for session in &sessions {
        let title = if session.title.is_empty() {
            "(untitled)".to_string()
        } else {
            truncate(&session.title, 40)
        };
        table.add_row(vec![
            Cell::new(session.id.to_string()).fg(Color::DarkGrey),
            Cell::new(title).fg(Color::Cyan),
            Cell::new(session.preferred_mode.to_string()),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  Sessions for '{}'", style(&user).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

pub(crate) fn print_message(message: &Message) {
    let who = match message.author {
        Role::User => style("you  ").green().bold(),
        Role::Agent => style("farum").magenta().bold(),
    };
    println!(
        "  {} {} {}",
        style(message.created_at.format("%H:%M:%S")).dim(),
        who,
        message.text
    );
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{head}...")
}
