//! User-facing reply texts. Never include credentials or raw error detail here.

pub const MSG_WELCOME: &str = "Hi! I'm a chat bot backed by a GPT model. Send me a message and I'll answer. \
Type /help to see what else I can do.";

pub const MSG_HELP: &str = "Just write to me and I'll reply, keeping the recent conversation in mind.\n\n\
/start - welcome message\n\
/help - this help\n\
/state - current service stability\n\
/model - show or switch the model (/model <name>)\n\
/reset - forget our conversation and start over";

pub const MSG_BUSY: &str = "The model is busy right now. Please try again in a little while.";

pub const MSG_FAILED: &str =
    "Sorry, I couldn't process that message. Try rephrasing it, or send /reset to start over.";

pub const MSG_TOO_LONG: &str =
    "That message is too long for me to process. Please send a shorter one.";

pub const MSG_UNAVAILABLE: &str =
    "The service is temporarily unavailable. Please try again later.";

/// Shown when the model returned no text.
pub const MSG_EMPTY_REPLY: &str = "(The model returned an empty reply.)";

pub const MSG_RESET_DONE: &str = "Conversation history cleared. Let's start over!";

pub const MSG_RESET_FAILED: &str = "Could not reset the conversation right now. Please try again later.";

pub fn model_menu_text(current: &str, allowed: &[String]) -> String {
    format!(
        "Current model: {}\nAvailable: {}\nSwitch with /model <name>.",
        current,
        allowed.join(", ")
    )
}

pub fn model_selected_text(model: &str) -> String {
    format!("Model set to {}.", model)
}

pub fn model_unknown_text(requested: &str, allowed: &[String]) -> String {
    format!(
        "Unknown model \"{}\". Available: {}",
        requested,
        allowed.join(", ")
    )
}

pub fn state_text(stability_percent: f64, total: u64) -> String {
    format!(
        "Service stability: {:.1}% ({} completion calls since start).",
        stability_percent, total
    )
}
