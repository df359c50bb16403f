//! gemi - Gemini plugin for the hamr launcher
//!
//! Provides:
//! - Default: serve plugin requests on stdin/stdout
//! - `ask`: run a single query from the terminal
//! - `config`: inspect and edit the settings file

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gemi_core::Controller;
use gemi_core::config::{Config, Directories, KNOWN_KEYS, Settings};
use gemi_core::plugin::{self, Reload};
use gemi_core::prompts::PromptTable;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Gemini plugin for the hamr launcher
#[derive(Parser, Debug)]
#[command(name = "gemi")]
#[command(version, about, long_about = None)]
#[command(after_help = "\
Examples:
  gemi                          Serve plugin requests (used by hamr)
  gemi ask what is rust         Ask a single question
  gemi ask code sort a vec      Ask with the \"code\" system prompt
  gemi config set api_key KEY   Store your Gemini API key
  gemi config set save_conversation true
  gemi config show              Print the effective settings
")]
struct Cli {
    /// Settings file (defaults to `~/.config/gemi/settings.json`)
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// System prompt table (defaults to `~/.config/gemi/system_messages.csv`)
    #[arg(long, global = true, value_name = "PATH")]
    prompts: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve plugin requests on stdin/stdout (default)
    Serve,

    /// Run a single query and print the plugin response
    Ask {
        /// Query text; the stop token is appended when missing
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Inspect or edit settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the settings file path
    Path,

    /// Print the effective settings, defaults included
    Show,

    /// Print one setting
    Get { key: String },

    /// Store one setting; VALUE is parsed as JSON, else kept as a string
    Set { key: String, value: String },
}

struct Paths {
    settings: PathBuf,
    prompts: PathBuf,
}

impl Paths {
    fn resolve(settings: Option<PathBuf>, prompts: Option<PathBuf>) -> Result<Self> {
        if let (Some(settings), Some(prompts)) = (&settings, &prompts) {
            return Ok(Self {
                settings: settings.clone(),
                prompts: prompts.clone(),
            });
        }

        let dirs = Directories::new().context("Failed to locate the gemi config directory")?;
        Ok(Self {
            settings: settings.unwrap_or(dirs.settings_file),
            prompts: prompts.unwrap_or(dirs.prompts_file),
        })
    }

    /// Settings and prompt table as currently on disk
    fn load(&self) -> Reload {
        Reload {
            config: Config::load(&self.settings),
            prompts: PromptTable::load(&self.prompts),
        }
    }
}

/// Set up logging to a timestamped file in the temp dir.
///
/// stdout carries the plugin protocol, so logs go to stderr only with `--verbose`.
fn setup_logging(verbose: bool) -> WorkerGuard {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gemi={default_level}")));

    let temp_dir = std::env::temp_dir();
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("gemi-{timestamp}.log");
    let log_path = temp_dir.join(&log_filename);

    #[cfg(unix)]
    {
        let symlink_path = temp_dir.join("gemi.log");
        let _ = std::fs::remove_file(&symlink_path);
        let _ = std::os::unix::fs::symlink(&log_path, &symlink_path);
    }

    let file_appender = tracing_appender::rolling::never(&temp_dir, &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(filter)
        .init();

    if verbose {
        eprintln!("Logging to: {} (and stderr)", log_path.display());
    }

    guard
}

async fn run_serve(paths: &Paths) -> Result<()> {
    let Reload { config, prompts } = paths.load();
    info!(
        model = %config.model,
        prompts = prompts.len(),
        save_conversation = config.save_conversation,
        "Starting gemi plugin"
    );

    let mut controller = Controller::new(config, prompts);
    plugin::serve(
        &mut controller,
        tokio::io::stdin(),
        tokio::io::stdout(),
        || Some(paths.load()),
    )
    .await
    .context("Plugin loop failed")
}

async fn run_ask(paths: &Paths, words: &[String]) -> Result<()> {
    let Reload { config, prompts } = paths.load();
    let query = with_stop_token(&words.join(" "), config.stop_token());

    let mut controller = Controller::new(config, prompts);
    let response = controller.handle_query(&query).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_config(paths: &Paths, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => println!("{}", paths.settings.display()),
        ConfigAction::Show => {
            let mut config = Config::load(&paths.settings);
            config.api_key = mask_secret(&config.api_key);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let settings = Settings::load(&paths.settings);
            let value = match settings.get(&key) {
                Some(value) => value.clone(),
                None => default_value(&key).with_context(|| format!("Unknown setting: {key}"))?,
            };
            println!("{}", display_value(&value));
        }
        ConfigAction::Set { key, value } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                bail!(
                    "Unknown setting: {key} (known settings: {})",
                    KNOWN_KEYS.join(", ")
                );
            }

            let value = parse_value(&value);
            Settings::check_value(&key, &value)?;

            let mut settings = Settings::load(&paths.settings);
            settings
                .set(key.clone(), value)
                .with_context(|| format!("Failed to write {}", settings.path().display()))?;
            println!("Set {key} in {}", paths.settings.display());
        }
    }
    Ok(())
}

/// Append the stop token unless the query already ends with it
fn with_stop_token(query: &str, stop: &str) -> String {
    let query = query.trim_end();
    if query.ends_with(stop) {
        query.to_string()
    } else {
        format!("{query} {stop}")
    }
}

/// Parse a command-line value as JSON, keeping it as a string otherwise
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn default_value(key: &str) -> Option<Value> {
    // Round-trip through text so f32 defaults print as written
    let defaults = serde_json::to_string(&Config::default()).ok()?;
    serde_json::from_str::<Value>(&defaults).ok()?.get(key).cloned()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.verbose);
    let paths = Paths::resolve(cli.settings, cli.prompts)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_serve(&paths).await,
        Commands::Ask { query } => run_ask(&paths, &query).await,
        Commands::Config { action } => run_config(&paths, action),
    }
}
