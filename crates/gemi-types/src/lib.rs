//! Shared types for gemi components.
//!
//! This crate provides the conversation model and the hamr plugin wire types used
//! by gemi-core and the gemi binary. All types are serializable for stdio transport.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deserialize a Vec that may be null or missing (both become empty vec)
fn deserialize_null_as_empty_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

// Serde skip_serializing_if requires &bool signature
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// Conversation
// ============================================================================

/// Author of a conversation turn, named the way the Gemini API names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a conversation.
///
/// `parts` always holds a single text segment when built through the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<String>,
}

impl Turn {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }

    /// All text parts joined together
    #[must_use]
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

// ============================================================================
// Result descriptors
// ============================================================================

/// Zero-argument handler a selectable result dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    ShowFullResponse,
    CopyToClipboard,
    OpenInFile,
    ClearHistory,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::ShowFullResponse => "show_full_response",
            Method::CopyToClipboard => "copy_to_clipboard",
            Method::OpenInFile => "open_in_file",
            Method::ClearHistory => "clear_history",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an item id does not name a [`Method`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown method: {}", self.0)
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "show_full_response" => Ok(Method::ShowFullResponse),
            "copy_to_clipboard" => Ok(Method::CopyToClipboard),
            "open_in_file" => Ok(Method::OpenInFile),
            "clear_history" => Ok(Method::ClearHistory),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Action button attached to a result item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub keep_open: bool,
}

impl Action {
    /// Button that dispatches to `method` when pressed
    #[must_use]
    pub fn for_method(method: Method, name: impl Into<String>, icon: &str) -> Self {
        Self {
            id: method.as_str().to_string(),
            name: name.into(),
            icon: Some(icon.to_string()),
            keep_open: false,
        }
    }
}

/// Result item shown in the launcher list.
///
/// `name` is the title and `description` the subtitle. Selecting an item whose `id`
/// names a [`Method`] dispatches to that handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_null_as_empty_vec"
    )]
    pub actions: Vec<Action>,

    /// Whether selecting this item should keep the launcher open
    #[serde(default, skip_serializing_if = "is_false")]
    pub keep_open: bool,
}

impl ResultItem {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn with_verb(mut self, verb: impl Into<String>) -> Self {
        self.verb = Some(verb.into());
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    #[must_use]
    pub fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }

    /// The handler this item dispatches to, if any
    #[must_use]
    pub fn method(&self) -> Option<Method> {
        self.id.parse().ok()
    }
}

/// Card data for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

/// Side effects the host performs on the plugin's behalf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteData {
    /// Open a file/folder with the default application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,

    /// Copy text to clipboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy: Option<String>,

    /// Show notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<bool>,
}

// ============================================================================
// Plugin wire protocol
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Initial,
    Search,
    Action,
    Form,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: String,
}

/// Input sent by the host (one JSON object per stdin line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInput {
    pub step: Step,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectedItem>,

    /// Action button id, when a button rather than the item itself was activated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl PluginInput {
    #[must_use]
    pub fn initial() -> Self {
        Self {
            step: Step::Initial,
            query: None,
            selected: None,
            action: None,
        }
    }

    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            step: Step::Search,
            query: Some(query.into()),
            ..Self::initial()
        }
    }

    #[must_use]
    pub fn action(item_id: impl Into<String>) -> Self {
        Self {
            step: Step::Action,
            selected: Some(SelectedItem { id: item_id.into() }),
            ..Self::initial()
        }
    }

    /// Resolve the handler this input dispatches to.
    ///
    /// An action button id takes precedence over the selected item id.
    #[must_use]
    pub fn method(&self) -> Option<Method> {
        if let Some(method) = self.action.as_deref().and_then(|a| a.parse().ok()) {
            return Some(method);
        }
        self.selected.as_ref().and_then(|s| s.id.parse().ok())
    }
}

/// Response written to the host (one JSON object per stdout line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PluginResponse {
    Results {
        items: Vec<ResultItem>,
    },

    Card {
        card: CardData,
    },

    Execute(ExecuteData),

    Error {
        message: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },

    /// No operation - plugin handled the input but has nothing to return
    Noop,
}

impl PluginResponse {
    #[must_use]
    pub fn results(items: Vec<ResultItem>) -> Self {
        PluginResponse::Results { items }
    }

    #[must_use]
    pub fn single(item: ResultItem) -> Self {
        PluginResponse::Results { items: vec![item] }
    }

    /// Items of a `results` response, empty for every other kind
    #[must_use]
    pub fn items(&self) -> &[ResultItem] {
        match self {
            PluginResponse::Results { items } => items,
            _ => &[],
        }
    }
}
