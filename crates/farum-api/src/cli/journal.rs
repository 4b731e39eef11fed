//! Journal CLI command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use farum_types::journal::{ActionStatus, JournalEntry};
use farum_types::session::UserId;

use crate::state::AppState;

/// Print a user's most recent journal entries.
///
/// # Examples
///
/// ```bash
/// farum journal --user ana --limit 5
/// ```
pub async fn show_journal(state: &AppState, user: String, limit: i64, json: bool) -> Result<()> {
    let ctx = state.request_context();
    let user = UserId::new(user);
    let entries = state.journal.get_user_journal(&ctx, &user, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!(
            "  {} '{}' has no journal entries yet.",
            style("i").blue().bold(),
            style(&user).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  Journal for '{}'", style(&user).cyan().bold());
    for entry in &entries {
        print_entry(entry);
    }
    println!();
    Ok(())
}

fn print_entry(entry: &JournalEntry) {
    println!();
    println!(
        "  {} {}",
        style(entry.created_at.format("%Y-%m-%d %H:%M")).bold(),
        style(format!("session {}", entry.session_id)).dim()
    );
    if !entry.problem_summary.is_empty() {
        println!("  {} {}", style("Problem:").bold(), entry.problem_summary);
    }
    if !entry.reflection.is_empty() {
        println!("  {}", entry.reflection);
    }
    if !entry.mood_before.is_empty() || !entry.mood_after.is_empty() {
        println!(
            "  {} {} → {}",
            style("Mood:").bold(),
            entry.mood_before,
            entry.mood_after
        );
    }
    if entry.action_plan.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Action").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Notes").fg(Color::White),
    ]);
    for action in &entry.action_plan {
        table.add_row(vec![
            Cell::new(&action.description).fg(Color::Cyan),
            status_cell(action.status),
            Cell::new(&action.notes).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
}

fn status_cell(status: ActionStatus) -> Cell {
    let color = match status {
        ActionStatus::Pending => Color::Yellow,
        ActionStatus::Done => Color::Green,
    };
    Cell::new(status.to_string()).fg(color)
}
