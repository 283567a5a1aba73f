// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for table construction and conversion.

use thiserror::Error;

/// Result type for core dataset operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building or converting in-memory tables.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("column '{column}' has {found} values, expected {expected}")]
	ColumnLengthMismatch {
		column: String,
		expected: usize,
		found: usize,
	},

	#[error("row has {found} values, table has {expected} columns")]
	RowArity { expected: usize, found: usize },

	#[error("duplicate column name: {0}")]
	DuplicateColumn(String),

	#[error("invalid GeoJSON: {0}")]
	InvalidGeoJson(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
