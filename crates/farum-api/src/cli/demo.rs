//! End-to-end demo: start a session and run one exchange through the pipeline.

use anyhow::Result;
use console::style;

use farum_types::session::{InteractionMode, UserId};

use super::session::print_message;
use crate::state::AppState;

/// Start a deep-dive session for `user`, send `text`, print the exchange
/// and the resulting journal entry count.
pub async fn run_demo(state: &AppState, user: String, text: &str, json: bool) -> Result<()> {
    let ctx = state.request_context();
    let user = UserId::new(user);

    let session = state
        .conversation
        .start_session(&ctx, user.clone(), InteractionMode::DeepDive, "Demo session")
        .await?;
    let output = state
        .conversation
        .send_message(&ctx, &session.id, &user, text)
        .await?;
    let timeline = state
        .conversation
        .get_session_timeline(&ctx, &session.id, 0)
        .await?;
    let journal = state.journal.get_user_journal(&ctx, &user, 0).await?;

    if json {
        let out = serde_json::json!({
            "session": timeline.session,
            "messages": timeline.messages,
            "reply": output.agent_message.text,
            "journal_entries": journal.len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Demo session {} ({})",
        style("⚡").bold(),
        style(session.id.to_string()).cyan(),
        session.preferred_mode
    );
    println!();
    for message in &timeline.messages {
        print_message(message);
    }
    println!();
    println!(
        "  {} {} journal entr{} for '{}'",
        style("•").dim(),
        style(journal.len()).bold(),
        if journal.len() == 1 { "y" } else { "ies" },
        user
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use farum_types::message::Role;

    use crate::state::test_support::memory_state;

    #[tokio::test]
    async fn test_demo_runs_one_exchange() {
        let state = memory_state();
        run_demo(&state, "demo-user".into(), "hello", true).await.unwrap();

        let ctx = state.request_context();
        let user = UserId::new("demo-user");
        let sessions = state.conversation.list_sessions(&ctx, &user, 0).await.unwrap();
        assert_eq!(sessions.len(), 1);

        let timeline = state
            .conversation
            .get_session_timeline(&ctx, &sessions[0].id, 0)
            .await
            .unwrap();
        let authors: Vec<Role> = timeline.messages.iter().map(|m| m.author).collect();
        assert_eq!(authors, vec![Role::Agent, Role::User, Role::Agent]);
    }
}
