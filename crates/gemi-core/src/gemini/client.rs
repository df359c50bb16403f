use super::api::{GenerateContentRequest, GenerateContentResponse, GenerationConfig, describe_error};
use super::{GenerationError, GenerationRequest, Generator};
use crate::Result;
use crate::config::Config;
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Gemini REST client built from one configuration snapshot.
///
/// Every call is stateless: multi-turn context travels in the request body.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS));

        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        builder = match config.proxy() {
            Some(proxy_url) => {
                debug!("Routing Gemini requests through proxy {proxy_url}");
                builder.proxy(reqwest::Proxy::all(proxy_url)?)
            }
            // Proxying is opt-in, so environment proxies are ignored too
            None => builder.no_proxy(),
        };

        let base = config.api_base_url.trim_end_matches('/');
        Ok(Self {
            http: builder.build()?,
            endpoint: format!("{base}/models/{}:generateContent", config.model),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        })
    }

    #[must_use]
    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub(crate) fn generation_config(&self) -> GenerationConfig {
        self.generation_config
    }
}

impl Generator for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> std::result::Result<String, GenerationError> {
        let prompt = request.effective_prompt();
        let history = request.history.unwrap_or_default();
        let body = GenerateContentRequest::new(history, &prompt, self.generation_config());

        debug!(
            model = %self.model(),
            history_turns = history.len(),
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini request failed: {e}");
                GenerationError::classify(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_error(status, &body);
            warn!("Gemini API error: {message}");
            return Err(GenerationError::classify(message));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            warn!("Failed to decode Gemini response: {e}");
            GenerationError::classify(format!("Invalid response from Gemini: {e}"))
        })?;

        parsed.into_text().map_err(|message| {
            warn!("Gemini returned no text: {message}");
            GenerationError::Other(message)
        })
    }
}
