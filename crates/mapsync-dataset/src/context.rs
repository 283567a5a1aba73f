// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection contexts: handles to a remote SQL store.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mapsync_dataset_core::{Table, TableRef};

use crate::credentials::Credentials;
use crate::error::ContextError;

/// Identity of a connection context.
///
/// Two contexts with the same key address the same remote store, so a
/// dataset moved between them stays in sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey(String);

impl ContextKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ContextKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// What a write does when the target table already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IfExists {
	/// Fail with [`ContextError::TableExists`].
	Fail,
	/// Drop and recreate the table.
	#[default]
	Replace,
	/// Add rows to the existing table.
	Append,
}

/// Operations the dataset layer needs from a remote store.
#[async_trait]
pub trait Context: Send + Sync + fmt::Debug {
	fn key(&self) -> ContextKey;

	/// Schema used for tables the caller does not qualify.
	fn default_schema(&self) -> &str;

	/// Account credentials, for contexts bound to the hosted platform.
	fn credentials(&self) -> Option<&Credentials> {
		None
	}

	/// Runs a query and returns its rows.
	async fn query(&self, sql: &str) -> Result<Table, ContextError>;

	/// Runs a statement, discarding any rows.
	async fn execute(&self, sql: &str) -> Result<(), ContextError>;

	async fn table_exists(&self, target: &TableRef) -> Result<bool, ContextError>;

	/// Writes a local table to `target`.
	async fn write_table(&self, target: &TableRef, table: &Table, if_exists: IfExists) -> Result<(), ContextError>;

	/// Materializes the result of `query` into `target` on the server.
	async fn create_table_as(&self, target: &TableRef, query: &str, if_exists: IfExists) -> Result<(), ContextError>;

	/// Drops `target`, returning whether it existed.
	async fn drop_table(&self, target: &TableRef) -> Result<bool, ContextError>;
}

/// Shared handle to a context.
pub type SharedContext = Arc<dyn Context>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn replace_is_default() {
		assert_eq!(IfExists::default(), IfExists::Replace);
	}

	#[test]
	fn key_display() {
		let key = ContextKey::new("alice@https://alice.carto.com/");
		assert_eq!(key.to_string(), "alice@https://alice.carto.com/");
		assert_eq!(key, ContextKey::new(key.as_str()));
	}
}
