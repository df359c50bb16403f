//! Test fixtures and helpers

use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::controller::Controller;
use crate::gemini::{GenerationError, GenerationRequest, Generator};
use crate::prompts::PromptTable;
use crate::{Error, Result};
use gemi_types::Turn;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One call seen by [`FakeGenerator`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub history: Option<Vec<Turn>>,
}

/// Generator that records every call and answers from a queue.
///
/// With an empty queue it answers `echo: <prompt>`. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeGenerator {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    replies: Arc<Mutex<VecDeque<std::result::Result<String, GenerationError>>>>,
    connects: Arc<AtomicUsize>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: std::result::Result<String, GenerationError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("no generation call recorded")
    }

    /// How many times the controller built a generator
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Generator for FakeGenerator {
    fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> impl Future<Output = std::result::Result<String, GenerationError>> + Send {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: request.prompt.to_string(),
            system_prompt: request.system_prompt.map(str::to_string),
            history: request.history.map(<[Turn]>::to_vec),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("echo: {}", request.prompt)));
        std::future::ready(reply)
    }
}

/// Clipboard that records copies, or fails every copy
#[derive(Debug, Clone, Default)]
pub struct FakeClipboard {
    copies: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn copies(&self) -> Vec<String> {
        self.copies.lock().unwrap().clone()
    }
}

impl Clipboard for FakeClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Clipboard("no display available".to_string()));
        }
        self.copies.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Config with an API key and defaults otherwise
pub fn test_config() -> Config {
    Config {
        api_key: "test-key".to_string(),
        ..Config::default()
    }
}

pub fn test_prompts() -> PromptTable {
    PromptTable::from_pairs([
        ("normal", "You are a helpful assistant."),
        ("code", "You are an expert programmer."),
        ("short", "Answer in one sentence."),
    ])
}

/// Controller wired to the given fakes
pub fn make_controller(
    config: Config,
    prompts: PromptTable,
    generator: &FakeGenerator,
    clipboard: &FakeClipboard,
) -> Controller<FakeGenerator> {
    let generator = generator.clone();
    Controller::with_parts(
        config,
        prompts,
        Box::new(move |_: &Config| -> Result<FakeGenerator> {
            generator.connects.fetch_add(1, Ordering::SeqCst);
            Ok(generator.clone())
        }),
        Box::new(clipboard.clone()),
    )
}

/// Controller with the test config and prompt table
pub fn default_controller(
    generator: &FakeGenerator,
    clipboard: &FakeClipboard,
) -> Controller<FakeGenerator> {
    make_controller(test_config(), test_prompts(), generator, clipboard)
}
