//! Tests for config reload functionality

use super::fixtures::{FakeClipboard, FakeGenerator, make_controller, test_prompts};
use crate::config::{Config, Settings};
use crate::plugin::{Reload, handle_input};
use crate::prompts::PromptTable;
use gemi_types::PluginInput;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn reload_from(path: &Path) -> impl FnMut() -> Option<Reload> + '_ {
    move || {
        Some(Reload {
            config: Config::load(path),
            prompts: test_prompts(),
        })
    }
}

#[test]
fn test_reload_config_updates_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    fs::write(&path, r#"{"model": "gemini-pro"}"#).unwrap();
    let config1 = Config::load(&path);
    assert_eq!(config1.model, "gemini-pro");

    fs::write(&path, r#"{"model": "gemini-1.5-flash"}"#).unwrap();
    let config2 = Config::load(&path);
    assert_eq!(config2.model, "gemini-1.5-flash");
}

#[test]
fn test_reload_config_preserves_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    fs::write(&path, r#"{"api_key": "k", "save_conversation": "true"}"#).unwrap();

    let config = Config::load(&path);
    assert!(config.save_conversation);
    assert_eq!(config.max_tokens, 1000);
    assert_eq!(config.prompt_stop, "||");
}

#[tokio::test]
async fn test_initial_step_applies_new_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    let generator = FakeGenerator::new();
    let clipboard = FakeClipboard::new();
    let mut controller =
        make_controller(Config::default(), test_prompts(), &generator, &clipboard);
    let mut reload = reload_from(&path);

    // No key yet
    let response = handle_input(&mut controller, PluginInput::initial(), &mut reload).await;
    assert_eq!(response.items()[0].name, "Please set your Gemini API key");

    Settings::load(&path).set("api_key", json!("fresh-key")).unwrap();

    let response = handle_input(&mut controller, PluginInput::initial(), &mut reload).await;
    assert_eq!(
        response.items()[0].name,
        "Type your prompt and end with '||' to submit"
    );
    assert_eq!(controller.config().api_key, "fresh-key");
}

#[tokio::test]
async fn test_settings_change_rebuilds_client() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(&path, r#"{"api_key": "k"}"#).unwrap();

    let generator = FakeGenerator::new();
    let clipboard = FakeClipboard::new();
    let config = Config::load(&path);
    let mut controller = make_controller(config, test_prompts(), &generator, &clipboard);
    let mut reload = reload_from(&path);

    handle_input(&mut controller, PluginInput::search("hello ||"), &mut reload).await;
    handle_input(&mut controller, PluginInput::initial(), &mut reload).await;
    handle_input(&mut controller, PluginInput::search("again ||"), &mut reload).await;
    assert_eq!(generator.connects(), 1);

    fs::write(&path, r#"{"api_key": "k", "temperature": "0.1"}"#).unwrap();
    handle_input(&mut controller, PluginInput::initial(), &mut reload).await;
    handle_input(&mut controller, PluginInput::search("third ||"), &mut reload).await;
    assert_eq!(generator.connects(), 2);
}

#[tokio::test]
async fn test_invalid_value_keeps_other_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(&path, r#"{"api_key": "k"}"#).unwrap();

    let generator = FakeGenerator::new();
    let clipboard = FakeClipboard::new();
    let config = Config::load(&path);
    let mut controller = make_controller(config, test_prompts(), &generator, &clipboard);
    let mut reload = reload_from(&path);

    fs::write(
        &path,
        r#"{"api_key": "other", "max_tokens": "lots", "model": "gemini-pro"}"#,
    )
    .unwrap();
    let response = handle_input(&mut controller, PluginInput::initial(), &mut reload).await;

    assert_eq!(
        response.items()[0].name,
        "Type your prompt and end with '||' to submit"
    );
    assert_eq!(controller.config().api_key, "other");
    assert_eq!(controller.config().model, "gemini-pro");
    assert_eq!(controller.config().max_tokens, 1000);
}

#[tokio::test]
async fn test_initial_step_reloads_prompt_table() {
    let temp_dir = TempDir::new().unwrap();
    let prompts_path = temp_dir.path().join("system_messages.csv");
    fs::write(&prompts_path, "Keyword,System Message\nnormal,Be brief.\n").unwrap();

    let generator = FakeGenerator::new();
    let clipboard = FakeClipboard::new();
    let config = Config {
        api_key: "k".to_string(),
        ..Config::default()
    };
    let mut controller =
        make_controller(config.clone(), PromptTable::default(), &generator, &clipboard);
    let mut reload = || {
        Some(Reload {
            config: config.clone(),
            prompts: PromptTable::load(&prompts_path),
        })
    };

    handle_input(&mut controller, PluginInput::search("normal hi ||"), &mut reload).await;
    assert_eq!(generator.last_call().system_prompt, None);

    handle_input(&mut controller, PluginInput::initial(), &mut reload).await;
    handle_input(&mut controller, PluginInput::search("normal hi ||"), &mut reload).await;
    let call = generator.last_call();
    assert_eq!(call.prompt, "hi");
    assert_eq!(call.system_prompt.as_deref(), Some("Be brief."));

    fs::write(
        &prompts_path,
        "Keyword,System Message\nnormal,Be thorough.\n",
    )
    .unwrap();
    handle_input(&mut controller, PluginInput::initial(), &mut reload).await;
    handle_input(&mut controller, PluginInput::search("normal hi ||"), &mut reload).await;
    assert_eq!(
        generator.last_call().system_prompt.as_deref(),
        Some("Be thorough.")
    );
}
