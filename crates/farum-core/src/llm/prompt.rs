//! Prompt assembly for LLM-backed reply generation.
//!
//! Turns a stage instruction plus the conversation context into the
//! `(system, user)` pair sent to a provider: a fixed companion persona with a
//! per-mode emphasis as the system prompt, and the recent history followed
//! by the new instruction as the user content.

use farum_types::conversation::ConversationContext;
use farum_types::message::Role;
use farum_types::session::InteractionMode;

const BASE_SYSTEM_PROMPT: &str = "\
You are Farum, an AI companion focused on well-being and personal growth.

Identity and tone:
- Answer in the same language the user writes in.
- Sound warm, grounded and human. Be gently direct when it helps, never cruel.
- Use simple, everyday language.

Your role:
- Listen with empathy and without judgment.
- Help the user clarify what they feel, what they need, and what they could do next.
- You are not a therapist, doctor or emergency service and you never diagnose.

Conversation style:
- First reflect back what you understood.
- Then, if it helps, ask one or two concrete questions.
- Only after that, and only if the user seems ready, suggest at most two small, realistic steps.
- Prefer one to three short conversational paragraphs. Use numbered lists only for concrete steps.

Safety:
- If the user mentions self-harm, suicide or harming someone, encourage them to contact local \
emergency services or a trusted person right away.
- Make clear you cannot replace professional care in a crisis.
- Never give instructions for harming oneself or others.

Internal lenses (never mention them to the user):
- check_in: more space for emotions and validation.
- deep_dive: more questions about context, history and patterns.
- action_plan: summarize briefly and offer one or two next steps as options.
";

const CHECK_IN_INSTRUCTIONS: &str = "\
For this reply, lean on the check_in lens:
- Name the emotions you notice and validate what the user is going through.
- Validation comes before anything else.
";

const DEEP_DIVE_INSTRUCTIONS: &str = "\
For this reply, lean on the deep_dive lens:
- Ask one or two concrete questions to understand the situation better.
- The main goal is insight; keep any suggestion small.
";

const ACTION_PLAN_INSTRUCTIONS: &str = "\
For this reply, lean on the action_plan lens:
- Briefly reflect what you understood.
- Offer one or two very small, realistic next steps as options, not orders.
";

/// A provider-neutral prompt: system instructions plus one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// System prompt for the given interaction mode.
pub fn system_prompt(mode: InteractionMode) -> String {
    format!("{BASE_SYSTEM_PROMPT}\n{}", mode_instructions(mode))
}

fn mode_instructions(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::CheckIn => CHECK_IN_INSTRUCTIONS,
        InteractionMode::DeepDive => DEEP_DIVE_INSTRUCTIONS,
        InteractionMode::ActionPlan => ACTION_PLAN_INSTRUCTIONS,
    }
}

/// Build the full prompt for `instruction` in `context`.
///
/// History is rendered one turn per line as `user: ...` or `assistant: ...`
/// under a "Conversation so far" heading, omitted entirely when empty.
pub fn build_prompt(instruction: &str, context: &ConversationContext) -> Prompt {
    let mut user = String::new();

    if !context.history.is_empty() {
        user.push_str("Conversation so far:\n");
        let lines: Vec<String> = context
            .history
            .iter()
            .map(|m| {
                let role = match m.author {
                    Role::User => "user",
                    Role::Agent => "assistant",
                };
                format!("{role}: {}", m.text)
            })
            .collect();
        user.push_str(&lines.join("\n"));
        user.push_str("\n\n");
    }

    user.push_str("New user message:\n");
    user.push_str(instruction);

    Prompt {
        system: system_prompt(context.mode),
        user,
    }
}
