pub mod clipboard;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod gemini;
pub mod plugin;
pub mod prompts;

mod error;

#[cfg(test)]
mod tests;

pub use controller::Controller;
pub use error::{Error, Result};

pub use gemi_types::*;
