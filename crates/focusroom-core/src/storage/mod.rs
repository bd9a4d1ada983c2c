mod config;
pub mod database;

pub use config::{BreaksConfig, Config, GeneralConfig, PresetConfig, PresetsConfig};
pub use database::{start_of_day, Database, Reflection, SessionRecord};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml`, `focusroom.db` and the log file.
///
/// `FOCUSROOM_HOME` overrides the location entirely. Otherwise this is
/// `~/.config/focusroom[-dev]/` depending on `FOCUSROOM_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSROOM_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusroom-dev")
            } else {
                base_dir.join("focusroom")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
