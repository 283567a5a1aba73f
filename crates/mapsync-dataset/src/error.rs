// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for contexts, datasets and configuration.

use std::path::PathBuf;
use std::time::Duration;

use mapsync_common_http::{is_retryable_status, RetryableError};
use mapsync_dataset_core::{CoreError, OriginKind};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by a connection context while talking to a store.
#[derive(Debug, Error)]
pub enum ContextError {
	/// HTTP request failed. The request URL is stripped since it carries
	/// the API key.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[source] reqwest::Error),

	/// Server returned a non-success response without SQL error details.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// Rate limited by the server.
	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited { retry_after_secs: Option<u64> },

	/// The store rejected the statement.
	#[error("SQL error: {}", .0.join("; "))]
	Sql(Vec<String>),

	#[error("no credentials configured")]
	MissingCredentials,

	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	#[error("table not found: {0}")]
	TableNotFound(String),

	#[error("table already exists: {0}")]
	TableExists(String),

	#[error("unsupported query: {0}")]
	UnsupportedQuery(String),

	#[error("schema mismatch: {0}")]
	SchemaMismatch(String),

	#[error("failed to decode response: {0}")]
	Decode(String),
}

impl From<reqwest::Error> for ContextError {
	fn from(e: reqwest::Error) -> Self {
		ContextError::RequestFailed(e.without_url())
	}
}

impl RetryableError for ContextError {
	fn is_retryable(&self) -> bool {
		match self {
			ContextError::RequestFailed(e) => e.is_retryable(),
			ContextError::ServerError { status, .. } => StatusCode::from_u16(*status)
				.map(is_retryable_status)
				.unwrap_or(false),
			ContextError::RateLimited { .. } => true,
			_ => false,
		}
	}

	fn retry_after(&self) -> Option<Duration> {
		match self {
			ContextError::RateLimited {
				retry_after_secs: Some(secs),
			} => Some(Duration::from_secs(*secs)),
			_ => None,
		}
	}
}

/// Errors raised by dataset operations.
#[derive(Debug, Error)]
pub enum DatasetError {
	/// Neither an explicit nor an attached context was available.
	#[error("no connection context: pass one explicitly or attach one to the dataset")]
	MissingContext,

	/// The operation needs a remote reference the dataset does not have.
	#[error("cannot {operation} a dataset with {origin} origin")]
	InvalidOrigin {
		origin: OriginKind,
		operation: &'static str,
	},

	#[error("invalid table name: {0:?}")]
	InvalidTableName(String),

	/// Nothing to upload: no local table and no remote source.
	#[error("dataset has no data to upload")]
	EmptyDataset,

	#[error(transparent)]
	Core(#[from] CoreError),

	#[error(transparent)]
	Context(#[from] ContextError),
}

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// I/O error reading or writing a config file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("TOML serialization error: {0}")]
	TomlSerialize(#[from] toml::ser::Error),

	/// Missing required field
	#[error("missing required field: {0}")]
	MissingField(String),

	/// Invalid value
	#[error("invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// Home directory not found
	#[error("could not determine home directory")]
	HomeDirNotFound,
}

impl ConfigError {
	pub fn missing_field(field: impl Into<String>) -> Self {
		Self::MissingField(field.into())
	}

	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transient_server_errors_are_retryable() {
		for status in [429, 408, 500, 502, 503, 504] {
			let err = ContextError::ServerError {
				status,
				message: "busy".to_string(),
			};
			assert!(err.is_retryable(), "status {status} should be retryable");
		}
	}

	#[test]
	fn client_errors_are_not_retryable() {
		for status in [400, 401, 403, 404] {
			let err = ContextError::ServerError {
				status,
				message: "nope".to_string(),
			};
			assert!(!err.is_retryable(), "status {status} should not be retryable");
		}
	}

	#[test]
	fn sql_errors_are_not_retryable() {
		let err = ContextError::Sql(vec!["relation \"x\" does not exist".to_string()]);
		assert!(!err.is_retryable());
		assert_eq!(err.to_string(), "SQL error: relation \"x\" does not exist");
	}

	#[test]
	fn rate_limit_carries_hint() {
		let err = ContextError::RateLimited {
			retry_after_secs: Some(3),
		};
		assert!(err.is_retryable());
		assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
	}

	#[test]
	fn invalid_origin_message_names_operation() {
		let err = DatasetError::InvalidOrigin {
			origin: OriginKind::Dataframe,
			operation: "download",
		};
		assert_eq!(err.to_string(), "cannot download a dataset with dataframe origin");
	}
}
