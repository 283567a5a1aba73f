// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use mapsync_dataset::DatasetError;
use thiserror::Error;

/// Errors raised while preparing or publishing a map.
#[derive(Debug, Error)]
pub enum PublishError {
	/// No context was given, attached to the layer or set on the publisher.
	#[error("no connection context available for publishing")]
	MissingContext,

	/// The publishing context carries no account credentials.
	#[error("publishing context has no account credentials")]
	MissingCredentials,

	#[error(transparent)]
	Dataset(#[from] DatasetError),

	/// The publication service returned an incomplete or unknown result.
	#[error("invalid publication: {0}")]
	InvalidPublication(String),

	#[error("publication API error: {0}")]
	Api(String),
}

pub type Result<T> = std::result::Result<T, PublishError>;
