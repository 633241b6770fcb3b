//! Configuration system for sunsched.
//!
//! Settings live in a single TOML file, `sunsched.toml`, looked up in:
//! 1. the directory given with `--config DIR`
//! 2. **XDG_CONFIG_HOME**/sunsched/sunsched.toml
//!
//! A missing file is not an error: every key has a default.
//!
//! ```toml
//! timezone = "America/Chicago"        # IANA timezone the schedules run in (default UTC)
//!
//! #[Location] required for SUNRISE/SUNSET commands
//! latitude = 41.8781                  # Geographic latitude (-90 to +90)
//! longitude = -87.6298                # Geographic longitude (-180 to +180)
//!
//! #[Storage]
//! state_dir = "/var/lib/sunsched"     # Where scheduler state is kept
//!                                     # (default XDG_STATE_HOME/sunsched)
//! default_message_type = "base:SetAttributes"
//! ```
//!
//! Latitude and longitude must be given together. Invalid values are rejected at
//! load time with a message naming the offending key.

pub mod loading;
pub mod validation;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::constants::*;
use crate::geo::GeoLocation;

pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Parsed contents of `sunsched.toml`. Absent keys fall back to defaults
/// through the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub state_dir: Option<PathBuf>,
    pub default_message_type: Option<String>,
}

impl Config {
    /// Configured timezone, UTC when unset.
    pub fn timezone(&self) -> Result<Tz> {
        let name = self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE);
        name.parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{name}': {e}"))
    }

    /// Configured location, `None` when no coordinates are set.
    pub fn location(&self) -> Result<Option<GeoLocation>> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                GeoLocation::from_coordinates(latitude, longitude).map(Some)
            }
            (None, None) => Ok(None),
            _ => anyhow::bail!("latitude and longitude must be set together"),
        }
    }

    /// Directory holding scheduler state files.
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        let state_home = match std::env::var_os("XDG_STATE_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".local/state"),
        };
        Ok(state_home.join(APP_NAME))
    }

    pub fn default_message_type(&self) -> &str {
        self.default_message_type
            .as_deref()
            .unwrap_or(DEFAULT_MESSAGE_TYPE)
    }

    /// Print the effective settings.
    pub fn log_config(&self, path: Option<&std::path::Path>) {
        match path {
            Some(path) if path.exists() => log_block_start!("Loaded configuration from {}", path.display()),
            _ => log_block_start!("Using default configuration"),
        }
        match self.timezone() {
            Ok(tz) => log_indented!("Timezone: {tz}"),
            Err(e) => log_indented!("Timezone: {e}"),
        }
        match self.location() {
            Ok(Some(location)) => log_indented!("Location: {location}"),
            Ok(None) => log_indented!("Location: not set (SUNRISE/SUNSET commands unavailable)"),
            Err(e) => log_indented!("Location: {e}"),
        }
        if let Ok(dir) = self.state_dir() {
            log_indented!("State directory: {}", dir.display());
        }
        log_indented!("Default message type: {}", self.default_message_type());
    }
}
