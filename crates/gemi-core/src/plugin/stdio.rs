use super::transport::JsonLineCodec;
use crate::Result;
use crate::config::Config;
use crate::controller::Controller;
use crate::gemini::Generator;
use crate::prompts::PromptTable;
use futures_util::{SinkExt, StreamExt};
use gemi_types::{PluginInput, PluginResponse, Step};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

/// Settings and prompt table as re-read from disk on an `initial` step
#[derive(Debug, Clone)]
pub struct Reload {
    pub config: Config,
    pub prompts: PromptTable,
}

/// Serve launcher requests from `reader` until end of input.
///
/// Every request line gets exactly one response line. A line that is not a valid
/// request is answered with an error response and the loop carries on. `reload`
/// is consulted on every `initial` step; returning `None` keeps the current
/// configuration and prompt table.
///
/// # Errors
///
/// Returns an error if reading or writing fails, or an input line exceeds the
/// maximum length.
pub async fn serve<G, R, W, F>(
    controller: &mut Controller<G>,
    reader: R,
    writer: W,
    mut reload: F,
) -> Result<()>
where
    G: Generator,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut() -> Option<Reload>,
{
    let mut requests = FramedRead::new(reader, JsonLineCodec::new());
    let mut responses = FramedWrite::new(writer, JsonLineCodec::new());

    info!("Serving plugin requests on stdio");

    while let Some(line) = requests.next().await {
        let line = line?;
        let response = match serde_json::from_str::<PluginInput>(&line) {
            Ok(input) => handle_input(controller, input, &mut reload).await,
            Err(e) => {
                warn!("Invalid request: {e}");
                PluginResponse::Error {
                    message: format!("Invalid input: {e}"),
                    details: Some(line),
                }
            }
        };
        responses.send(response).await?;
    }

    info!("Input closed, shutting down");
    Ok(())
}

/// Route one request to the controller
pub async fn handle_input<G, F>(
    controller: &mut Controller<G>,
    input: PluginInput,
    reload: &mut F,
) -> PluginResponse
where
    G: Generator,
    F: FnMut() -> Option<Reload>,
{
    debug!("Handling {:?} step", input.step);
    match input.step {
        Step::Initial => {
            if let Some(Reload { config, prompts }) = reload() {
                controller.reconfigure(config);
                controller.set_prompts(prompts);
            }
            controller.prompt_hint()
        }
        Step::Search => {
            controller
                .handle_query(input.query.as_deref().unwrap_or_default())
                .await
        }
        Step::Action => match input.method() {
            Some(method) => controller.dispatch(method),
            None => {
                debug!(
                    selected = ?input.selected,
                    action = ?input.action,
                    "Ignoring unknown action"
                );
                PluginResponse::Noop
            }
        },
        Step::Form => PluginResponse::Noop,
    }
}
