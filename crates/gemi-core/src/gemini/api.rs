//! Wire types for the Gemini `generateContent` REST endpoint.

use gemi_types::{Role, Turn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    /// History turns in order, followed by the new user prompt
    pub fn new(history: &'a [Turn], prompt: &'a str, generation_config: GenerationConfig) -> Self {
        let mut contents: Vec<Content<'a>> = history
            .iter()
            .map(|turn| Content {
                role: turn.role,
                parts: turn.parts.iter().map(|text| Part { text }).collect(),
            })
            .collect();
        contents.push(Content {
            role: Role::User,
            parts: vec![Part { text: prompt }],
        });

        Self {
            contents,
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub role: Role,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,

    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,

    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,

    /// Thinking models mark reasoning parts; they are not part of the answer
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate.
    ///
    /// Returns a description of the problem when the prompt was blocked or no
    /// text came back.
    pub fn into_text(self) -> Result<String, String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(format!("Prompt was blocked: {reason}"));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err("Response contained no candidates".to_string());
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            Err(format!(
                "Response contained no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        } else {
            Ok(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,

    #[serde(default)]
    status: Option<String>,

    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

/// One-line description of a failed HTTP response.
///
/// Uses Google's error envelope when present so the status code, API status and
/// detail reasons (e.g. `API_KEY_INVALID`) all reach the error classifier.
pub(crate) fn describe_error(status: StatusCode, body: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        let body = body.trim();
        return if body.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {body}")
        };
    };

    let error = envelope.error;
    let mut message = match error.status {
        Some(api_status) => format!("{} {api_status}: {}", status.as_u16(), error.message),
        None => format!("{}: {}", status.as_u16(), error.message),
    };

    let reasons: Vec<String> = error
        .details
        .into_iter()
        .filter_map(|detail| detail.reason)
        .collect();
    if !reasons.is_empty() {
        message.push_str(&format!(" ({})", reasons.join(", ")));
    }

    message
}
