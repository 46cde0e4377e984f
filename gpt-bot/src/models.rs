//! Per-conversation model choice, restricted to the configured allow-list.
//!
//! Choices live in memory and reset to the default model on restart.

use dashmap::DashMap;
use tracing::info;

#[derive(Debug)]
pub struct ModelSelection {
    default_model: String,
    allowed: Vec<String>,
    chosen: DashMap<String, String>,
}

impl ModelSelection {
    /// `default_model` is always selectable, even if missing from `allowed`.
    pub fn new(default_model: impl Into<String>, allowed: Vec<String>) -> Self {
        let default_model = default_model.into();
        let mut models = vec![default_model.clone()];
        for model in allowed {
            if !models.contains(&model) {
                models.push(model);
            }
        }
        Self {
            default_model,
            allowed: models,
            chosen: DashMap::new(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Exact, case-insensitive lookup; returns the canonical spelling.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.allowed
            .iter()
            .find(|m| m.eq_ignore_ascii_case(name.trim()))
            .map(String::as_str)
    }

    pub fn current(&self, conversation_id: &str) -> String {
        self.chosen
            .get(conversation_id)
            .map(|m| m.value().clone())
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Returns the model now in effect, or `None` when `name` is not allowed.
    pub fn select(&self, conversation_id: &str, name: &str) -> Option<String> {
        let model = self.find(name)?.to_string();
        if model == self.default_model {
            self.chosen.remove(conversation_id);
        } else {
            self.chosen
                .insert(conversation_id.to_string(), model.clone());
        }
        info!(conversation_id = %conversation_id, model = %model, "Model selected");
        Some(model)
    }
}
