//! Token estimation and budget fitting.

use thiserror::Error;

use crate::ChatMessage;

/// Per-message framing cost (role markers, separators) added on top of the content estimate.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Estimates the token count for a text string: one token per 4 bytes, at least one.
pub fn estimate_tokens(text: &str) -> usize {
    ((text.len() as f64) / 4.0).ceil().max(1.0) as usize
}

/// Estimated tokens one message occupies in the prompt.
pub fn estimate_message_tokens(message: &ChatMessage) -> usize {
    estimate_tokens(&message.content) + MESSAGE_OVERHEAD_TOKENS
}

/// Model context window and the share of it reserved for the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudget {
    pub context_limit: usize,
    pub reserved_for_completion: usize,
}

impl PromptBudget {
    pub fn new(context_limit: usize, reserved_for_completion: usize) -> Self {
        Self {
            context_limit,
            reserved_for_completion,
        }
    }

    /// Tokens available to the prompt.
    pub fn available(&self) -> usize {
        self.context_limit
            .saturating_sub(self.reserved_for_completion)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    /// The system prompt plus the new message alone exceed the budget.
    #[error("prompt needs {required} tokens but only {available} are available")]
    TooLong { required: usize, available: usize },
}

/// Result of [`fit_to_budget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedPrompt {
    /// System (if any), kept history oldest-first, then the current message.
    pub messages: Vec<ChatMessage>,
    /// Number of history messages dropped from the front.
    pub dropped: usize,
    pub estimated_tokens: usize,
}

/// Assembles `system` + `history` + `current` and drops the oldest history messages until the
/// estimate fits `budget.available()`. History is kept as a contiguous most-recent suffix.
pub fn fit_to_budget(
    system: Option<&str>,
    history: Vec<ChatMessage>,
    current: ChatMessage,
    budget: PromptBudget,
) -> Result<FittedPrompt, PromptError> {
    let available = budget.available();
    let system = system.map(ChatMessage::system);

    let fixed_tokens = system.iter().map(estimate_message_tokens).sum::<usize>()
        + estimate_message_tokens(&current);
    if fixed_tokens > available {
        return Err(PromptError::TooLong {
            required: fixed_tokens,
            available,
        });
    }

    let mut used = fixed_tokens;
    let mut keep_from = history.len();
    for (i, msg) in history.iter().enumerate().rev() {
        let cost = estimate_message_tokens(msg);
        if used + cost > available {
            break;
        }
        used += cost;
        keep_from = i;
    }

    let dropped = keep_from;
    let mut messages = Vec::with_capacity(history.len() - dropped + 2);
    messages.extend(system);
    messages.extend(history.into_iter().skip(dropped));
    messages.push(current);

    Ok(FittedPrompt {
        messages,
        dropped,
        estimated_tokens: used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_coverage() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("x"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("Hello world"), 3);
    }

    #[test]
    fn test_message_overhead_is_added() {
        assert_eq!(estimate_message_tokens(&ChatMessage::user("abcd")), 5);
    }

    #[test]
    fn test_available_saturates() {
        assert_eq!(PromptBudget::new(4096, 512).available(), 3584);
        assert_eq!(PromptBudget::new(100, 200).available(), 0);
    }
}
