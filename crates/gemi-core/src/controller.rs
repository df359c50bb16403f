//! Query controller.
//!
//! Interprets raw launcher queries, owns the conversation transcript and the last
//! response, and answers with result items. Selecting an item dispatches back into
//! one of the zero-argument handlers.

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::Config;
use crate::conversation::Transcript;
use crate::gemini::{GeminiClient, GenerationRequest, Generator};
use crate::prompts::PromptTable;
use crate::{Error, Result};
use gemi_types::{Action, CardData, ExecuteData, Method, PluginResponse, ResultItem};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const ICON: &str = "auto_awesome";
const PREVIEW_CHARS: usize = 100;
const RESPONSE_TITLE: &str = "Response from Gemini";

/// Builds a generator from a configuration snapshot
pub type Connector<G> = Box<dyn Fn(&Config) -> Result<G> + Send>;

/// Outcome of checking a raw query against the stop token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedQuery<'a> {
    /// Stop token not typed yet
    Incomplete,
    /// Stop token typed with nothing before it
    Empty,
    /// Query text with the stop token and surrounding whitespace removed
    Ready(&'a str),
}

/// Strip the stop token from `raw`
#[must_use]
pub fn parse_query<'a>(raw: &'a str, stop: &str) -> ParsedQuery<'a> {
    let Some(body) = raw.strip_suffix(stop) else {
        return ParsedQuery::Incomplete;
    };
    match body.trim() {
        "" => ParsedQuery::Empty,
        text => ParsedQuery::Ready(text),
    }
}

/// Query text after system prompt selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery<'a> {
    pub text: String,
    pub system_prompt: Option<&'a str>,
}

/// Select a system prompt for `query`.
///
/// A leading keyword found in the table is consumed and selects its message.
/// Otherwise, when the query has more than one word, the `default_keyword` row is
/// used and the query is left as typed.
#[must_use]
pub fn resolve_prompt<'a>(
    query: &str,
    prompts: &'a PromptTable,
    default_keyword: &str,
) -> ResolvedQuery<'a> {
    let words: Vec<&str> = query.split_whitespace().collect();
    let Some(first) = words.first() else {
        return ResolvedQuery {
            text: String::new(),
            system_prompt: None,
        };
    };

    let system_prompt = prompts.lookup(first).or_else(|| {
        (words.len() > 1)
            .then(|| prompts.lookup(default_keyword))
            .flatten()
    });

    // Whenever a system prompt resolves, the first word is consumed
    match system_prompt {
        Some(message) => ResolvedQuery {
            text: words[1..].join(" "),
            system_prompt: Some(message),
        },
        None => ResolvedQuery {
            text: query.to_string(),
            system_prompt: None,
        },
    }
}

/// Subtitle preview: the whole text up to 100 characters, else a truncated prefix
#[must_use]
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub struct Controller<G = GeminiClient> {
    config: Config,
    prompts: PromptTable,
    transcript: Transcript,
    last_response: Option<String>,
    generator: Option<G>,
    connect: Connector<G>,
    clipboard: Box<dyn Clipboard + Send>,
}

impl Controller<GeminiClient> {
    /// Controller talking to the Gemini API and the desktop clipboard
    #[must_use]
    pub fn new(config: Config, prompts: PromptTable) -> Self {
        Self::with_parts(
            config,
            prompts,
            Box::new(GeminiClient::new),
            Box::new(SystemClipboard::new()),
        )
    }
}

impl<G: Generator> Controller<G> {
    #[must_use]
    pub fn with_parts(
        config: Config,
        prompts: PromptTable,
        connect: Connector<G>,
        clipboard: Box<dyn Clipboard + Send>,
    ) -> Self {
        Self {
            config,
            prompts,
            transcript: Transcript::new(),
            last_response: None,
            generator: None,
            connect,
            clipboard,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The pending response consumed by copy and open actions
    #[must_use]
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    #[must_use]
    pub(crate) fn is_connected(&self) -> bool {
        self.generator.is_some()
    }

    /// Apply a freshly loaded configuration.
    ///
    /// A changed configuration drops the generator so the next query rebuilds it.
    /// The transcript is kept.
    pub fn reconfigure(&mut self, config: Config) {
        if config == self.config {
            return;
        }
        info!("Configuration changed, Gemini client will be rebuilt");
        self.config = config;
        self.reset_session();
    }

    /// Swap in a freshly loaded prompt table
    pub fn set_prompts(&mut self, prompts: PromptTable) {
        debug!(rows = prompts.len(), "Prompt table loaded");
        self.prompts = prompts;
    }

    /// Drop the generator. The transcript is left untouched.
    pub fn reset_session(&mut self) {
        if self.is_connected() {
            debug!("Dropped Gemini client");
        }
        self.generator = None;
    }

    /// Item shown before anything is typed
    #[must_use]
    pub fn prompt_hint(&self) -> PluginResponse {
        if self.config.has_api_key() {
            PluginResponse::single(instruction_item(self.config.stop_token()))
        } else {
            PluginResponse::single(missing_key_item())
        }
    }

    /// Handle one query event from the launcher.
    ///
    /// Only a query ending in the stop token reaches the API. Failures become a
    /// single result item; nothing here is fatal.
    pub async fn handle_query(&mut self, raw_query: &str) -> PluginResponse {
        if !self.config.has_api_key() {
            return PluginResponse::single(missing_key_item());
        }

        let stop = self.config.stop_token();
        let query = match parse_query(raw_query, stop) {
            ParsedQuery::Incomplete => return PluginResponse::single(instruction_item(stop)),
            ParsedQuery::Empty => return PluginResponse::single(empty_prompt_item(stop)),
            ParsedQuery::Ready(query) => query,
        };

        let resolved = resolve_prompt(query, &self.prompts, &self.config.default_prompt);
        if resolved.text.is_empty() {
            return PluginResponse::single(empty_prompt_item(stop));
        }

        let generator = match connected(&mut self.generator, &self.connect, &self.config) {
            Ok(generator) => generator,
            Err(e) => {
                warn!("Failed to create Gemini client: {e}");
                return PluginResponse::single(error_item(format!(
                    "Failed to create Gemini client: {e}"
                )));
            }
        };

        let save = self.config.save_conversation;
        let request = GenerationRequest::new(&resolved.text)
            .with_system_prompt(resolved.system_prompt)
            .with_history(save.then(|| self.transcript.turns()));

        debug!(
            system_prompt = resolved.system_prompt.is_some(),
            history_turns = request.history.map_or(0, <[_]>::len),
            "Submitting query"
        );

        let result = generator.generate(&request).await;
        match result {
            Ok(response) => {
                info!(chars = response.chars().count(), "Received response");
                if save {
                    self.transcript.push_exchange(resolved.text, response.clone());
                    debug!(exchanges = self.transcript.exchanges(), "Saved exchange");
                }
                let items = response_items(&response, save);
                self.last_response = Some(response);
                PluginResponse::results(items)
            }
            Err(e) => {
                warn!("Generation failed: {e}");
                PluginResponse::single(error_item(e.user_message()))
            }
        }
    }

    /// Run the handler a selected item names
    pub fn dispatch(&mut self, method: Method) -> PluginResponse {
        debug!("Dispatching {method}");
        match method {
            Method::ShowFullResponse => self.show_full_response(),
            Method::CopyToClipboard => self.copy_to_clipboard(),
            Method::OpenInFile => self.open_in_file(),
            Method::ClearHistory => self.clear_history(),
        }
    }

    #[must_use]
    pub fn show_full_response(&self) -> PluginResponse {
        let Some(response) = self.last_response.as_deref() else {
            return PluginResponse::single(no_response_item());
        };
        PluginResponse::Card {
            card: CardData {
                title: RESPONSE_TITLE.to_string(),
                markdown: Some(response.to_string()),
                actions: response_actions(),
                ..Default::default()
            },
        }
    }

    pub fn copy_to_clipboard(&mut self) -> PluginResponse {
        let Some(response) = self.last_response.as_deref() else {
            return PluginResponse::single(no_response_item());
        };
        match self.clipboard.set_text(response) {
            Ok(()) => PluginResponse::single(
                ResultItem::new("info", "Copied!")
                    .with_description("Response copied to clipboard")
                    .with_icon("content_copy"),
            ),
            Err(e) => {
                warn!("Copy failed: {e}");
                PluginResponse::single(error_item(format!("Failed to copy: {e}")))
            }
        }
    }

    /// Write the response to a new text file and ask the host to open it
    #[must_use]
    pub fn open_in_file(&self) -> PluginResponse {
        let Some(response) = self.last_response.as_deref() else {
            return PluginResponse::single(no_response_item());
        };
        match write_response_file(response) {
            Ok(path) => {
                info!("Saved response to {}", path.display());
                PluginResponse::Execute(ExecuteData {
                    open: Some(path.to_string_lossy().into_owned()),
                    notify: Some("Response opened in text file".to_string()),
                    close: Some(true),
                    ..Default::default()
                })
            }
            Err(e) => {
                warn!("Failed to save response: {e}");
                PluginResponse::single(error_item(format!("Failed to open file: {e}")))
            }
        }
    }

    pub fn clear_history(&mut self) -> PluginResponse {
        self.transcript.clear();
        info!("Conversation history cleared");
        PluginResponse::single(
            ResultItem::new("info", "Cleared!")
                .with_description("Conversation history cleared")
                .with_icon("delete_sweep"),
        )
    }
}

fn connected<'g, G>(
    slot: &'g mut Option<G>,
    connect: &Connector<G>,
    config: &Config,
) -> Result<&'g G> {
    let generator = match slot.take() {
        Some(generator) => generator,
        None => {
            info!(model = %config.model, "Creating Gemini client");
            connect(config)?
        }
    };
    Ok(slot.insert(generator))
}

fn write_response_file(text: &str) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("gemi-response-")
        .suffix(".txt")
        .tempfile()?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    let (_, path) = file.keep().map_err(|e| Error::Io(e.error))?;
    Ok(path)
}

fn response_actions() -> Vec<Action> {
    vec![
        Action::for_method(Method::CopyToClipboard, "Copy", "content_copy"),
        Action::for_method(Method::OpenInFile, "Open", "open_in_new"),
    ]
}

fn response_items(response: &str, save_conversation: bool) -> Vec<ResultItem> {
    let mut items = vec![
        ResultItem::new(Method::ShowFullResponse.as_str(), RESPONSE_TITLE)
            .with_description(preview(response))
            .with_icon(ICON)
            .with_verb("View")
            .with_actions(response_actions())
            .keep_open(),
        ResultItem::new(Method::CopyToClipboard.as_str(), "Copy to clipboard")
            .with_description("Copy the full response to clipboard")
            .with_icon("content_copy")
            .with_verb("Copy"),
        ResultItem::new(Method::OpenInFile.as_str(), "Open in text file")
            .with_description("Open the response in a new text file")
            .with_icon("open_in_new")
            .with_verb("Open"),
    ];

    if save_conversation {
        items.push(
            ResultItem::new(Method::ClearHistory.as_str(), "Clear conversation history")
                .with_description("Start a new conversation")
                .with_icon("delete_sweep")
                .with_verb("Clear")
                .keep_open(),
        );
    }

    items
}

fn missing_key_item() -> ResultItem {
    ResultItem::new("info", "Please set your Gemini API key")
        .with_description("Run `gemi config set api_key <KEY>` to configure")
        .with_icon("key")
}

fn instruction_item(stop: &str) -> ResultItem {
    ResultItem::new(
        "info",
        format!("Type your prompt and end with '{stop}' to submit"),
    )
    .with_description(format!("Example: what is AI? {stop}"))
    .with_icon(ICON)
}

fn empty_prompt_item(stop: &str) -> ResultItem {
    ResultItem::new("info", "Please enter a prompt")
        .with_description(format!("Type your question before {stop}"))
        .with_icon(ICON)
}

fn no_response_item() -> ResultItem {
    ResultItem::new("info", "No response yet")
        .with_description("Submit a prompt first")
        .with_icon(ICON)
}

fn error_item(message: impl Into<String>) -> ResultItem {
    ResultItem::new("error", "Error")
        .with_description(message)
        .with_icon("error")
}
