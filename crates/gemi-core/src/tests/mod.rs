//! Test module for gemi-core
//!
//! This module contains tests for:
//! - Configuration loading, coercion and persistence
//! - Settings reload through the plugin loop
//! - Query handling, system prompts and the conversation transcript
//! - The Gemini REST client against a mock server
//! - The stdio request loop

// Test modules use exact float comparisons
#![allow(clippy::float_cmp)]

mod config_reload_tests;
mod fixtures;
mod gemini_client_tests;
