//! Generation adapter for the hosted Gemini API.
//!
//! [`Generator`] is the seam the controller calls through; [`GeminiClient`] is the
//! production implementation. Failures come back as a typed [`GenerationError`]
//! whose display text is what the user sees.

mod api;
mod client;
mod error;

pub use api::GenerationConfig;
pub use client::GeminiClient;
pub use error::GenerationError;

use gemi_types::Turn;
use std::future::Future;

/// One generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub system_prompt: Option<&'a str>,
    /// Prior turns; `None` makes the call single-turn
    pub history: Option<&'a [Turn]>,
}

impl<'a> GenerationRequest<'a> {
    #[must_use]
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            system_prompt: None,
            history: None,
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: Option<&'a str>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Option<&'a [Turn]>) -> Self {
        self.history = history;
        self
    }

    /// Prompt text actually sent: the system prompt, if any, goes first
    #[must_use]
    pub fn effective_prompt(&self) -> String {
        match self.system_prompt {
            Some(system) if !system.is_empty() => format!("{system}\n\nUser: {}", self.prompt),
            _ => self.prompt.to_string(),
        }
    }
}

/// Something that turns a prompt into response text
pub trait Generator {
    fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;

    /// Like [`Generator::generate`], but never fails: errors degrade to their
    /// user-facing text.
    fn respond(&self, request: &GenerationRequest<'_>) -> impl Future<Output = String> + Send
    where
        Self: Sync,
    {
        async move {
            match self.generate(request).await {
                Ok(text) => text,
                Err(e) => e.user_message(),
            }
        }
    }
}
