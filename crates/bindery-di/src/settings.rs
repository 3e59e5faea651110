//! Container settings
//!
//! Settings load from TOML or from `BINDERY_`-prefixed environment variables.
//! Missing fields take their defaults.
//!
//! ```
//! use bindery_di::DiSettings;
//!
//! let settings = DiSettings::from_toml_str("max_translation_depth = 3").unwrap();
//! assert_eq!(settings.max_translation_depth, 3);
//! assert_eq!(settings.max_resolution_depth, 100);
//! ```

use crate::cycle_detection::DEFAULT_MAX_RESOLUTION_DEPTH;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BINDERY_";

/// Default bound on chained context translations
pub const DEFAULT_MAX_TRANSLATION_DEPTH: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to parse settings: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid value for '{key}': {message}")]
	InvalidValue { key: String, message: String },
}

/// Resolution limits applied by a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiSettings {
	/// Maximum number of nested resolutions on one call stack
	pub max_resolution_depth: usize,
	/// Maximum number of context translations for one request
	pub max_translation_depth: usize,
}

impl Default for DiSettings {
	fn default() -> Self {
		Self {
			max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
			max_translation_depth: DEFAULT_MAX_TRANSLATION_DEPTH,
		}
	}
}

impl DiSettings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
		self.max_resolution_depth = depth;
		self
	}

	pub fn with_max_translation_depth(mut self, depth: usize) -> Self {
		self.max_translation_depth = depth;
		self
	}

	/// Parses and validates settings from a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Reads `BINDERY_MAX_RESOLUTION_DEPTH` and `BINDERY_MAX_TRANSLATION_DEPTH`.
	///
	/// Unset variables keep their defaults.
	pub fn from_env() -> Result<Self, SettingsError> {
		let mut settings = Self::default();
		if let Some(depth) = read_env("MAX_RESOLUTION_DEPTH")? {
			settings.max_resolution_depth = depth;
		}
		if let Some(depth) = read_env("MAX_TRANSLATION_DEPTH")? {
			settings.max_translation_depth = depth;
		}
		settings.validate()?;
		Ok(settings)
	}

	/// A resolution depth of zero would reject every request.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.max_resolution_depth == 0 {
			return Err(SettingsError::InvalidValue {
				key: "max_resolution_depth".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		Ok(())
	}
}

fn read_env(name: &str) -> Result<Option<usize>, SettingsError> {
	let key = format!("{ENV_PREFIX}{name}");
	match env::var(&key) {
		Ok(raw) => raw
			.trim()
			.parse()
			.map(Some)
			.map_err(|err: std::num::ParseIntError| SettingsError::InvalidValue {
				key,
				message: err.to_string(),
			}),
		Err(env::VarError::NotPresent) => Ok(None),
		Err(err) => Err(SettingsError::InvalidValue {
			key,
			message: err.to_string(),
		}),
	}
}
