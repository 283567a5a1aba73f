// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process context backed by a map of tables.
//!
//! Answers `SELECT * FROM "schema"."table"` for stored tables plus any query
//! registered with [`MemoryContextBuilder::query_result`]. Every statement it
//! would have sent to a real store is recorded and can be inspected with
//! [`MemoryContext::statements`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mapsync_dataset_core::{sql, Table, TableRef, DEFAULT_SCHEMA};
use tokio::sync::Mutex;
use tracing::debug;

use crate::context::{Context, ContextKey, IfExists};
use crate::error::ContextError;

#[derive(Debug, Default)]
struct MemoryState {
	tables: HashMap<TableRef, Table>,
	queries: HashMap<String, Table>,
	statements: Vec<String>,
}

/// Context that keeps tables in memory.
///
/// Clones share the same store.
#[derive(Debug, Clone)]
pub struct MemoryContext {
	name: String,
	default_schema: String,
	state: Arc<Mutex<MemoryState>>,
}

impl MemoryContext {
	/// Creates an empty store. Contexts with the same name share a key.
	pub fn new(name: impl Into<String>) -> Self {
		Self::builder(name).build()
	}

	pub fn builder(name: impl Into<String>) -> MemoryContextBuilder {
		MemoryContextBuilder {
			name: name.into(),
			default_schema: DEFAULT_SCHEMA.to_string(),
			state: MemoryState::default(),
		}
	}

	/// Current contents of a stored table.
	pub async fn table(&self, target: &TableRef) -> Option<Table> {
		self.state.lock().await.tables.get(target).cloned()
	}

	/// Statements issued so far, oldest first.
	pub async fn statements(&self) -> Vec<String> {
		self.state.lock().await.statements.clone()
	}

	/// Stores a table directly, bypassing statement recording.
	pub async fn insert_table(&self, target: TableRef, table: Table) {
		self.state.lock().await.tables.insert(target, table);
	}

	/// Resolves a query against canned results and stored tables.
	fn resolve(state: &MemoryState, query: &str) -> Result<Table, ContextError> {
		let normalized = normalize_query(query);
		if let Some(table) = state.queries.get(normalized) {
			return Ok(table.clone());
		}

		match parse_select_all(normalized) {
			Some(target) => state
				.tables
				.get(&target)
				.cloned()
				.ok_or_else(|| ContextError::TableNotFound(target.to_string())),
			None => Err(ContextError::UnsupportedQuery(normalized.to_string())),
		}
	}

	fn store(state: &mut MemoryState, target: &TableRef, table: Table, if_exists: IfExists) -> Result<(), ContextError> {
		let existing = match (state.tables.get_mut(target), if_exists) {
			(Some(_), IfExists::Fail) => return Err(ContextError::TableExists(target.to_string())),
			(Some(existing), IfExists::Append) => existing,
			_ => {
				state.tables.insert(target.clone(), table);
				return Ok(());
			}
		};

		let same_columns = existing.columns().len() == table.columns().len()
			&& existing
				.columns()
				.iter()
				.zip(table.columns())
				.all(|(a, b)| a.name == b.name);
		if !same_columns {
			return Err(ContextError::SchemaMismatch(format!(
				"columns of {target} do not match the appended table"
			)));
		}

		for row in table.rows() {
			existing
				.push_row(row.clone())
				.map_err(|e| ContextError::SchemaMismatch(e.to_string()))?;
		}
		Ok(())
	}
}

/// Builder for [`MemoryContext`].
#[derive(Debug)]
pub struct MemoryContextBuilder {
	name: String,
	default_schema: String,
	state: MemoryState,
}

impl MemoryContextBuilder {
	pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
		self.default_schema = schema.into();
		self
	}

	/// Seeds a stored table.
	pub fn table(mut self, target: TableRef, table: Table) -> Self {
		self.state.tables.insert(target, table);
		self
	}

	/// Registers the result returned for an exact query text.
	pub fn query_result(mut self, query: impl AsRef<str>, table: Table) -> Self {
		self
			.state
			.queries
			.insert(normalize_query(query.as_ref()).to_string(), table);
		self
	}

	pub fn build(self) -> MemoryContext {
		MemoryContext {
			name: self.name,
			default_schema: self.default_schema,
			state: Arc::new(Mutex::new(self.state)),
		}
	}
}

#[async_trait]
impl Context for MemoryContext {
	fn key(&self) -> ContextKey {
		ContextKey::new(format!("memory:{}", self.name))
	}

	fn default_schema(&self) -> &str {
		&self.default_schema
	}

	async fn query(&self, sql: &str) -> Result<Table, ContextError> {
		let mut state = self.state.lock().await;
		state.statements.push(sql.to_string());
		Self::resolve(&state, sql)
	}

	async fn execute(&self, sql: &str) -> Result<(), ContextError> {
		self.state.lock().await.statements.push(sql.to_string());
		Ok(())
	}

	async fn table_exists(&self, target: &TableRef) -> Result<bool, ContextError> {
		let mut state = self.state.lock().await;
		state.statements.push(sql::table_exists(target));
		Ok(state.tables.contains_key(target))
	}

	async fn write_table(&self, target: &TableRef, table: &Table, if_exists: IfExists) -> Result<(), ContextError> {
		let mut state = self.state.lock().await;
		state.statements.push(sql::create_table(target, table));
		Self::store(&mut state, target, table.clone(), if_exists)?;

		debug!(context = %self.name, table = %target, rows = table.num_rows(), "stored table");
		Ok(())
	}

	async fn create_table_as(&self, target: &TableRef, query: &str, if_exists: IfExists) -> Result<(), ContextError> {
		let mut state = self.state.lock().await;
		state.statements.push(sql::create_table_as(target, query));
		let table = Self::resolve(&state, query)?;
		Self::store(&mut state, target, table, if_exists)
	}

	async fn drop_table(&self, target: &TableRef) -> Result<bool, ContextError> {
		let mut state = self.state.lock().await;
		state.statements.push(sql::drop_table_if_exists(target));
		Ok(state.tables.remove(target).is_some())
	}
}

fn normalize_query(query: &str) -> &str {
	query.trim().trim_end_matches(';').trim_end()
}

/// Parses `SELECT * FROM "schema"."name"`.
fn parse_select_all(query: &str) -> Option<TableRef> {
	let rest = query.strip_prefix("SELECT * FROM ")?;
	let (schema, rest) = parse_quoted(rest)?;
	let rest = rest.strip_prefix('.')?;
	let (name, rest) = parse_quoted(rest)?;
	rest.is_empty().then(|| TableRef::new(schema, name))
}

fn parse_quoted(input: &str) -> Option<(String, &str)> {
	let mut chars = input.strip_prefix('"')?.char_indices().peekable();
	let mut ident = String::new();

	while let Some((idx, c)) = chars.next() {
		if c != '"' {
			ident.push(c);
			continue;
		}
		if matches!(chars.peek(), Some((_, '"'))) {
			chars.next();
			ident.push('"');
			continue;
		}
		// `idx` is relative to the input without its opening quote.
		return Some((ident, &input[idx + 2..]));
	}
	None
}
