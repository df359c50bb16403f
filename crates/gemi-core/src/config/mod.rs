mod dirs;
mod settings;
mod validation;

pub use dirs::Directories;
pub use settings::{Config, KNOWN_KEYS, Settings};
pub use validation::{find_unknown_keys, warn_unknown_fields};
