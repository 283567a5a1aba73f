// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration and credential storage.
//!
//! Credentials are read from `$XDG_CONFIG_HOME/mapsync/credentials.toml`
//! (falling back to `~/.config`), then overridden field by field by the
//! `MAPSYNC_USERNAME`, `MAPSYNC_API_KEY` and `MAPSYNC_BASE_URL` environment
//! variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mapsync_common_http::RetryConfig;
use mapsync_dataset_core::DEFAULT_SCHEMA;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::{ApiKey, Credentials};
use crate::error::ConfigError;

pub const ENV_USERNAME: &str = "MAPSYNC_USERNAME";
pub const ENV_API_KEY: &str = "MAPSYNC_API_KEY";
pub const ENV_BASE_URL: &str = "MAPSYNC_BASE_URL";

const CREDENTIALS_FILE: &str = "mapsync/credentials.toml";

/// Tuning for the SQL API context.
#[derive(Debug, Clone)]
pub struct SqlApiConfig {
	/// Timeout for HTTP requests.
	pub request_timeout: Duration,
	/// Retry configuration for HTTP requests.
	pub retry_config: RetryConfig,
	/// Rows per `INSERT` statement when uploading.
	pub insert_batch_rows: usize,
	/// Register created tables with the platform after creation.
	pub cartodbfy: bool,
	/// Schema used for tables the caller does not qualify.
	pub default_schema: String,
}

impl Default for SqlApiConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(30),
			retry_config: RetryConfig::default(),
			insert_batch_rows: 500,
			cartodbfy: true,
			default_schema: DEFAULT_SCHEMA.to_string(),
		}
	}
}

/// On-disk shape of the credentials file. Every field is optional so that
/// the environment can fill the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsFile {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_url: Option<String>,
}

impl CredentialsFile {
	/// Reads the file, returning an empty value when it does not exist.
	pub fn read(path: &Path) -> Result<Self, ConfigError> {
		let content = match std::fs::read_to_string(path) {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "no credentials file");
				return Ok(Self::default());
			}
			Err(e) => return Err(e.into()),
		};

		toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Applies overrides from a variable lookup (normally the process
	/// environment). Empty values are ignored.
	pub fn with_overrides<F>(mut self, lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

		if let Some(username) = get(ENV_USERNAME) {
			self.username = Some(username);
		}
		if let Some(api_key) = get(ENV_API_KEY) {
			self.api_key = Some(api_key);
		}
		if let Some(base_url) = get(ENV_BASE_URL) {
			self.base_url = Some(base_url);
		}
		self
	}

	/// Validates the collected fields into [`Credentials`].
	pub fn into_credentials(self) -> Result<Credentials, ConfigError> {
		let username = self.username.ok_or_else(|| ConfigError::missing_field("username"))?;
		let api_key = self.api_key.ok_or_else(|| ConfigError::missing_field("api_key"))?;

		let credentials = Credentials::new(username, ApiKey::new(api_key))?;
		match self.base_url {
			Some(base_url) => credentials.with_base_url(&base_url),
			None => Ok(credentials),
		}
	}
}

impl From<&Credentials> for CredentialsFile {
	fn from(credentials: &Credentials) -> Self {
		Self {
			username: Some(credentials.username().to_string()),
			api_key: Some(credentials.api_key().expose().to_string()),
			base_url: Some(credentials.base_url().to_string()),
		}
	}
}

/// Default location of the credentials file.
pub fn credentials_path() -> Result<PathBuf, ConfigError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
		Some(dir) => PathBuf::from(dir),
		None => dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?.join(".config"),
	};
	Ok(config_home.join(CREDENTIALS_FILE))
}

/// Loads credentials from the default file and the environment.
pub fn load_credentials() -> Result<Credentials, ConfigError> {
	load_credentials_from(&credentials_path()?)
}

/// Loads credentials from `path` and the environment.
pub fn load_credentials_from(path: &Path) -> Result<Credentials, ConfigError> {
	let credentials = CredentialsFile::read(path)?
		.with_overrides(|name| std::env::var(name).ok())
		.into_credentials()?;

	debug!(
		path = %path.display(),
		username = %credentials.username(),
		base_url = %credentials.base_url(),
		"loaded credentials"
	);
	Ok(credentials)
}

/// Writes credentials to `path`, creating parent directories. On unix the
/// file is made readable by the owner only.
pub fn save_credentials(credentials: &Credentials, path: &Path) -> Result<(), ConfigError> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}

	let content = toml::to_string(&CredentialsFile::from(credentials))?;
	std::fs::write(path, content)?;

	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
	}

	debug!(path = %path.display(), "saved credentials");
	Ok(())
}
