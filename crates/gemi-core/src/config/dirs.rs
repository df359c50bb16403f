use crate::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Application directories following XDG spec
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/gemi)
    pub config: PathBuf,

    /// Settings file path
    pub settings_file: PathBuf,

    /// System prompt table
    pub prompts_file: PathBuf,
}

impl Directories {
    /// Create a new `Directories` instance with standard XDG paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the system's project directories cannot be determined
    /// (no home directory).
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("", "", "gemi").ok_or_else(|| {
            Error::Config("Failed to determine project directories".to_string())
        })?;

        Ok(Self::with_base(project.config_dir().to_path_buf()))
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            settings_file: base.join("settings.json"),
            prompts_file: base.join("system_messages.csv"),
            config: base,
        }
    }

    /// Ensure the config directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)
    }
}
