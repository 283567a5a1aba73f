// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account credentials for the hosted platform.

use std::fmt;

use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::ConfigError;

/// Domain of the hosted platform when no base URL is given.
pub const DEFAULT_DOMAIN: &str = "carto.com";

const REDACTED: &str = "[REDACTED]";

/// API key that never shows up in logs and is wiped from memory on drop.
///
/// Call [`ApiKey::expose`] at the point where the key goes on the wire.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for ApiKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ApiKey").field(&REDACTED).finish()
	}
}

impl fmt::Display for ApiKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

/// Username, API key and account base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
	username: String,
	api_key: ApiKey,
	base_url: Url,
}

impl Credentials {
	/// Credentials for a cloud account at `https://{username}.carto.com/`.
	pub fn new(username: impl Into<String>, api_key: ApiKey) -> Result<Self, ConfigError> {
		let username = username.into();
		if username.trim().is_empty() {
			return Err(ConfigError::missing_field("username"));
		}

		let base_url = parse_base_url(&format!("https://{username}.{DEFAULT_DOMAIN}/"))?;
		Ok(Self {
			username,
			api_key,
			base_url,
		})
	}

	/// Overrides the account base URL, e.g. `https://maps.example.com/user/alice`.
	pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
		self.base_url = parse_base_url(base_url)?;
		Ok(self)
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	pub fn api_key(&self) -> &ApiKey {
		&self.api_key
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Endpoint of the SQL API for this account.
	pub fn sql_endpoint(&self) -> Result<Url, ConfigError> {
		self
			.base_url
			.join("api/v2/sql")
			.map_err(|e| ConfigError::invalid_value("base_url", e.to_string()))
	}
}

/// Parses a base URL and makes sure relative joins land below it.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
	let normalized = if raw.ends_with('/') {
		raw.to_string()
	} else {
		format!("{raw}/")
	};

	let url = Url::parse(&normalized).map_err(|e| ConfigError::invalid_value("base_url", e.to_string()))?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::invalid_value(
			"base_url",
			format!("unsupported scheme '{}'", url.scheme()),
		));
	}
	Ok(url)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn api_key_is_redacted() {
		let key = ApiKey::new("super-secret");
		assert_eq!(format!("{key}"), "[REDACTED]");
		assert_eq!(format!("{key:?}"), "ApiKey(\"[REDACTED]\")");
		assert_eq!(key.expose(), "super-secret");
	}

	#[test]
	fn credentials_debug_hides_key() {
		let creds = Credentials::new("alice", ApiKey::new("super-secret")).unwrap();
		assert!(!format!("{creds:?}").contains("super-secret"));
	}

	#[test]
	fn default_base_url_uses_username() {
		let creds = Credentials::new("alice", ApiKey::new("k")).unwrap();
		assert_eq!(creds.base_url().as_str(), "https://alice.carto.com/");
		assert_eq!(
			creds.sql_endpoint().unwrap().as_str(),
			"https://alice.carto.com/api/v2/sql"
		);
	}

	#[test]
	fn on_premises_base_url_keeps_path() {
		let creds = Credentials::new("alice", ApiKey::new("k"))
			.unwrap()
			.with_base_url("https://maps.example.com/user/alice")
			.unwrap();
		assert_eq!(
			creds.sql_endpoint().unwrap().as_str(),
			"https://maps.example.com/user/alice/api/v2/sql"
		);
	}

	#[test]
	fn rejects_empty_username() {
		assert!(matches!(
			Credentials::new("  ", ApiKey::new("k")),
			Err(ConfigError::MissingField(field)) if field == "username"
		));
	}

	#[test]
	fn rejects_non_http_base_url() {
		let result = Credentials::new("alice", ApiKey::new("k"))
			.unwrap()
			.with_base_url("ftp://example.com");
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}
}
