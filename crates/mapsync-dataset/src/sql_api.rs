// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Context backed by the hosted SQL API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mapsync_common_http::RetryConfig;
use mapsync_dataset_core::{sql, Column, ColumnType, Table, TableRef};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::config::SqlApiConfig;
use crate::context::{Context, ContextKey, IfExists};
use crate::credentials::Credentials;
use crate::error::ContextError;

const STATEMENT_PREVIEW_CHARS: usize = 120;

/// Builder for constructing a [`SqlApiContext`].
#[derive(Debug, Default)]
pub struct SqlApiContextBuilder {
	credentials: Option<Credentials>,
	config: SqlApiConfig,
}

impl SqlApiContextBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn credentials(mut self, credentials: Credentials) -> Self {
		self.credentials = Some(credentials);
		self
	}

	/// Replaces the whole configuration.
	pub fn config(mut self, config: SqlApiConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Sets the retry configuration.
	pub fn retry_config(mut self, config: RetryConfig) -> Self {
		self.config.retry_config = config;
		self
	}

	pub fn insert_batch_rows(mut self, rows: usize) -> Self {
		self.config.insert_batch_rows = rows;
		self
	}

	pub fn cartodbfy(mut self, enabled: bool) -> Self {
		self.config.cartodbfy = enabled;
		self
	}

	pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
		self.config.default_schema = schema.into();
		self
	}

	pub fn build(self) -> Result<SqlApiContext, ContextError> {
		let credentials = self.credentials.ok_or(ContextError::MissingCredentials)?;
		let endpoint = credentials
			.sql_endpoint()
			.map_err(|e| ContextError::InvalidBaseUrl(e.to_string()))?;

		let http = mapsync_common_http::builder()
			.timeout(self.config.request_timeout)
			.build()?;

		info!(
			username = %credentials.username(),
			endpoint = %endpoint,
			"SQL API context initialized"
		);

		Ok(SqlApiContext {
			inner: Arc::new(SqlApiContextInner {
				credentials,
				endpoint,
				http,
				config: self.config,
			}),
		})
	}
}

#[derive(Debug)]
struct SqlApiContextInner {
	credentials: Credentials,
	endpoint: Url,
	http: Client,
	config: SqlApiConfig,
}

/// Connection context for an account on the hosted platform.
///
/// # Example
///
/// ```ignore
/// use mapsync_dataset::{ApiKey, Credentials, SqlApiContext};
///
/// let credentials = Credentials::new("alice", ApiKey::new("api_key"))?;
/// let ctx = SqlApiContext::builder().credentials(credentials).build()?;
/// let table = ctx.query("SELECT * FROM stores").await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqlApiContext {
	inner: Arc<SqlApiContextInner>,
}

#[derive(Serialize)]
struct SqlRequest<'a> {
	q: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct SqlResponse {
	#[serde(default)]
	rows: Vec<Map<String, Value>>,
	#[serde(default)]
	fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct SqlErrorBody {
	error: Vec<String>,
}

impl SqlApiContext {
	pub fn builder() -> SqlApiContextBuilder {
		SqlApiContextBuilder::new()
	}

	pub fn config(&self) -> &SqlApiConfig {
		&self.inner.config
	}

	async fn run(&self, statement: &str) -> Result<SqlResponse, ContextError> {
		mapsync_common_http::retry(&self.inner.config.retry_config, || self.send(statement)).await
	}

	async fn send(&self, statement: &str) -> Result<SqlResponse, ContextError> {
		debug!(
			endpoint = %self.inner.endpoint,
			statement = %preview(statement),
			"Sending SQL statement"
		);

		let response = self
			.inner
			.http
			.post(self.inner.endpoint.clone())
			.query(&[("api_key", self.inner.credentials.api_key().expose())])
			.json(&SqlRequest { q: statement })
			.send()
			.await?;

		let status = response.status();
		if status == StatusCode::TOO_MANY_REQUESTS {
			let retry_after = response
				.headers()
				.get("Retry-After")
				.and_then(|v| v.to_str().ok())
				.and_then(|s| s.parse().ok());
			return Err(ContextError::RateLimited {
				retry_after_secs: retry_after,
			});
		}

		let body = response.text().await?;
		if !status.is_success() {
			if let Ok(SqlErrorBody { error }) = serde_json::from_str::<SqlErrorBody>(&body) {
				error!(status = status.as_u16(), errors = ?error, "SQL statement rejected");
				return Err(ContextError::Sql(error));
			}
			error!(status = status.as_u16(), message = %body, "SQL API request failed");
			return Err(ContextError::ServerError {
				status: status.as_u16(),
				message: body,
			});
		}

		if body.trim().is_empty() {
			return Ok(SqlResponse::default());
		}
		serde_json::from_str(&body).map_err(|e| ContextError::Decode(e.to_string()))
	}

	async fn prepare_target(&self, target: &TableRef, if_exists: IfExists) -> Result<bool, ContextError> {
		let exists = self.table_exists(target).await?;
		match (exists, if_exists) {
			(true, IfExists::Fail) => Err(ContextError::TableExists(target.to_string())),
			(true, IfExists::Append) => Ok(false),
			(true, IfExists::Replace) => {
				self.execute(&sql::drop_table_if_exists(target)).await?;
				Ok(true)
			}
			(false, _) => Ok(true),
		}
	}

	async fn register(&self, target: &TableRef) -> Result<(), ContextError> {
		if self.inner.config.cartodbfy {
			self.execute(&sql::cartodbfy(target)).await?;
		}
		Ok(())
	}
}

#[async_trait]
impl Context for SqlApiContext {
	fn key(&self) -> ContextKey {
		ContextKey::new(format!(
			"{}@{}",
			self.inner.credentials.username(),
			self.inner.credentials.base_url()
		))
	}

	fn default_schema(&self) -> &str {
		&self.inner.config.default_schema
	}

	fn credentials(&self) -> Option<&Credentials> {
		Some(&self.inner.credentials)
	}

	async fn query(&self, sql: &str) -> Result<Table, ContextError> {
		let response = self.run(sql).await?;
		decode_table(response)
	}

	async fn execute(&self, sql: &str) -> Result<(), ContextError> {
		self.run(sql).await.map(|_| ())
	}

	async fn table_exists(&self, target: &TableRef) -> Result<bool, ContextError> {
		let response = self.run(&sql::table_exists(target)).await?;
		let count = response
			.rows
			.first()
			.and_then(|row| row.get("n"))
			.and_then(|n| match n {
				Value::Number(n) => n.as_u64(),
				Value::String(s) => s.parse().ok(),
				_ => None,
			})
			.ok_or_else(|| ContextError::Decode("missing table count".to_string()))?;
		Ok(count > 0)
	}

	async fn write_table(&self, target: &TableRef, table: &Table, if_exists: IfExists) -> Result<(), ContextError> {
		let create = self.prepare_target(target, if_exists).await?;
		if create {
			self.execute(&sql::create_table(target, table)).await?;
		}

		let batches = sql::insert_batches(target, table, self.inner.config.insert_batch_rows);
		for statement in &batches {
			self.execute(statement).await?;
		}

		if create {
			self.register(target).await?;
		}

		info!(
			table = %target,
			rows = table.num_rows(),
			batches = batches.len(),
			"Table written"
		);
		Ok(())
	}

	async fn create_table_as(&self, target: &TableRef, query: &str, if_exists: IfExists) -> Result<(), ContextError> {
		if self.prepare_target(target, if_exists).await? {
			self.execute(&sql::create_table_as(target, query)).await?;
			self.register(target).await?;
		} else {
			self.execute(&sql::insert_from_query(target, query)).await?;
		}

		info!(table = %target, "Table materialized from query");
		Ok(())
	}

	async fn drop_table(&self, target: &TableRef) -> Result<bool, ContextError> {
		let existed = self.table_exists(target).await?;
		self.execute(&sql::drop_table_if_exists(target)).await?;
		Ok(existed)
	}
}

/// Converts an SQL API response into a table, keeping the field order.
fn decode_table(response: SqlResponse) -> Result<Table, ContextError> {
	let SqlResponse { rows, fields } = response;

	let names: Vec<String> = if fields.is_empty() {
		rows.first().map(|row| row.keys().cloned().collect()).unwrap_or_default()
	} else {
		fields.keys().cloned().collect()
	};

	let columns: Vec<Column> = names
		.iter()
		.map(|name| {
			let declared = fields
				.get(name)
				.and_then(|field| field.get("type"))
				.and_then(Value::as_str)
				.map(ColumnType::from_sql_api);
			let kind = match declared {
				// The API reports every numeric type as "number".
				Some(ColumnType::Float) => refine_number(&rows, name),
				Some(kind) => kind,
				None => ColumnType::infer(rows.iter().filter_map(|row| row.get(name))),
			};
			Column::new(name.clone(), kind)
		})
		.collect();

	let rows: Vec<Vec<Value>> = rows
		.into_iter()
		.map(|mut row| {
			names
				.iter()
				.map(|name| row.remove(name).unwrap_or(Value::Null))
				.collect()
		})
		.collect();

	Table::from_rows(columns, rows).map_err(|e| ContextError::Decode(e.to_string()))
}

fn refine_number(rows: &[Map<String, Value>], name: &str) -> ColumnType {
	let mut values = rows.iter().filter_map(|row| row.get(name)).filter(|v| !v.is_null()).peekable();
	if values.peek().is_some() && values.all(|v| v.is_i64() || v.is_u64()) {
		ColumnType::Integer
	} else {
		ColumnType::Float
	}
}

fn preview(statement: &str) -> String {
	let mut chars = statement.chars();
	let head: String = chars.by_ref().take(STATEMENT_PREVIEW_CHARS).collect();
	if chars.next().is_some() {
		format!("{head}...")
	} else {
		head
	}
}
