// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Datasets and their synchronization state.
//!
//! A [`Dataset`] records a sync point whenever it is known to mirror a
//! remote table: at construction from a table, after downloading a table and
//! after any upload. [`Dataset::is_sync`] compares the current state against
//! that point and never talks to the network.

use mapsync_dataset_core::{table_from_geojson, OriginKind, Table, TableFingerprint, TableRef, DEFAULT_SCHEMA};
use serde_json::Value;
use tracing::{debug, info};

use crate::context::{ContextKey, IfExists, SharedContext};
use crate::error::{ContextError, DatasetError, Result};

/// Platform-managed column that is never part of a downloaded snapshot.
pub const WEBMERCATOR_COLUMN: &str = "the_geom_webmercator";

/// Options for [`Dataset::upload_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
	pub if_exists: IfExists,
	/// Target schema; the context default when unset.
	pub schema: Option<String>,
}

impl UploadOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn if_exists(mut self, if_exists: IfExists) -> Self {
		self.if_exists = if_exists;
		self
	}

	pub fn schema(mut self, schema: impl Into<String>) -> Self {
		self.schema = Some(schema.into());
		self
	}
}

#[derive(Debug, Clone)]
struct Snapshot {
	table: Table,
	fingerprint: TableFingerprint,
}

impl Snapshot {
	fn new(table: Table) -> Self {
		let fingerprint = table.fingerprint();
		Self { table, fingerprint }
	}
}

/// State that must be unchanged for a dataset to count as synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SyncPoint {
	table_name: Option<String>,
	schema: String,
	context: Option<ContextKey>,
	fingerprint: Option<TableFingerprint>,
}

/// Tabular data bound to a remote table, a remote query or a local table.
#[derive(Debug, Clone)]
pub struct Dataset {
	origin: OriginKind,
	table_name: Option<String>,
	schema: String,
	query: Option<String>,
	context: Option<SharedContext>,
	snapshot: Option<Snapshot>,
	synced: Option<SyncPoint>,
}

impl Dataset {
	fn empty(origin: OriginKind, context: Option<SharedContext>) -> Self {
		let schema = context
			.as_ref()
			.map(|ctx| ctx.default_schema().to_string())
			.unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

		Self {
			origin,
			table_name: None,
			schema,
			query: None,
			context,
			snapshot: None,
			synced: None,
		}
	}

	/// A dataset mirroring an existing remote table in the context's default
	/// schema. It is in sync from the start.
	pub fn from_table(table_name: impl Into<String>, context: SharedContext) -> Self {
		let schema = context.default_schema().to_string();
		Self::from_table_in_schema(table_name, schema, context)
	}

	pub fn from_table_in_schema(table_name: impl Into<String>, schema: impl Into<String>, context: SharedContext) -> Self {
		let mut dataset = Self::empty(OriginKind::Table, Some(context));
		dataset.table_name = Some(table_name.into());
		dataset.schema = schema.into();
		dataset.synced = Some(dataset.sync_point(None));
		dataset
	}

	/// A dataset over the result of a remote query.
	pub fn from_query(query: impl Into<String>, context: SharedContext) -> Self {
		let mut dataset = Self::empty(OriginKind::Query, Some(context));
		dataset.query = Some(query.into());
		dataset
	}

	/// A dataset over a local table.
	pub fn from_dataframe(table: Table) -> Self {
		let mut dataset = Self::empty(OriginKind::Dataframe, None);
		dataset.snapshot = Some(Snapshot::new(table));
		dataset
	}

	/// A dataset over a GeoJSON FeatureCollection, Feature or geometry.
	pub fn from_geojson(document: &Value) -> Result<Self> {
		let table = table_from_geojson(document)?;
		let mut dataset = Self::empty(OriginKind::Geojson, None);
		dataset.snapshot = Some(Snapshot::new(table));
		Ok(dataset)
	}

	pub fn origin(&self) -> OriginKind {
		self.origin
	}

	pub fn table_name(&self) -> Option<&str> {
		self.table_name.as_deref()
	}

	pub fn schema(&self) -> &str {
		&self.schema
	}

	pub fn query(&self) -> Option<&str> {
		self.query.as_deref()
	}

	pub fn context(&self) -> Option<&SharedContext> {
		self.context.as_ref()
	}

	/// Local snapshot, if one was given or downloaded.
	pub fn table(&self) -> Option<&Table> {
		self.snapshot.as_ref().map(|s| &s.table)
	}

	/// The remote table this dataset names, if any.
	pub fn table_ref(&self) -> Option<TableRef> {
		self
			.table_name
			.as_ref()
			.map(|name| TableRef::new(self.schema.clone(), name.clone()))
	}

	/// Whether the data is known to be present remotely.
	pub fn is_remote(&self) -> bool {
		self.origin.is_remote()
	}

	/// Whether the dataset mirrors a remote table unchanged since the last
	/// construction from a table, download or upload.
	pub fn is_sync(&self) -> bool {
		self.origin == OriginKind::Table && self.synced.as_ref() == Some(&self.current_sync_point())
	}

	pub fn set_table_name(&mut self, table_name: impl Into<String>) {
		self.table_name = Some(table_name.into());
	}

	pub fn set_schema(&mut self, schema: impl Into<String>) {
		self.schema = schema.into();
	}

	pub fn set_context(&mut self, context: Option<SharedContext>) {
		self.context = context;
	}

	/// Replaces the local snapshot. Content equal to the synchronized
	/// snapshot keeps the dataset in sync.
	pub fn set_table(&mut self, table: Option<Table>) {
		self.snapshot = table.map(Snapshot::new);
	}

	/// Fetches the remote data into the local snapshot.
	///
	/// Table datasets are in sync afterwards. Query datasets keep their
	/// origin and stay out of sync until uploaded.
	pub async fn download(&mut self) -> Result<&Table> {
		let statement = match (self.origin, &self.query, self.table_ref()) {
			(OriginKind::Table, _, Some(target)) => target.select_all(),
			(OriginKind::Query, Some(query), _) => query.clone(),
			(origin, _, _) => {
				return Err(DatasetError::InvalidOrigin {
					origin,
					operation: "download",
				})
			}
		};
		let context = self.context.clone().ok_or(DatasetError::MissingContext)?;

		let table = context.query(&statement).await?.without_columns(&[WEBMERCATOR_COLUMN]);
		let snapshot = Snapshot::new(table);

		info!(
			origin = %self.origin,
			context = %context.key(),
			rows = snapshot.table.num_rows(),
			fingerprint = %snapshot.fingerprint,
			"Dataset downloaded"
		);

		if self.origin == OriginKind::Table {
			self.synced = Some(self.sync_point(Some(snapshot.fingerprint)));
		}
		Ok(&self.snapshot.insert(snapshot).table)
	}

	/// Uploads to `table_name`, replacing any existing table.
	///
	/// Uses `context` when given, otherwise the dataset's own.
	pub async fn upload(&mut self, table_name: impl Into<String>, context: Option<SharedContext>) -> Result<()> {
		self.upload_with(table_name, context, UploadOptions::default()).await
	}

	/// Uploads to `table_name` and makes the dataset a table dataset in sync
	/// with it.
	///
	/// The local snapshot is written when present. Without one, query
	/// datasets are materialized on the server and table datasets are copied.
	pub async fn upload_with(
		&mut self,
		table_name: impl Into<String>,
		context: Option<SharedContext>,
		options: UploadOptions,
	) -> Result<()> {
		let table_name = table_name.into();
		if table_name.trim().is_empty() {
			return Err(DatasetError::InvalidTableName(table_name));
		}

		let context = context
			.or_else(|| self.context.clone())
			.ok_or(DatasetError::MissingContext)?;
		let schema = options
			.schema
			.unwrap_or_else(|| context.default_schema().to_string());
		let target = TableRef::new(schema, table_name);

		self.push(&context, &target, options.if_exists).await?;

		let key = context.key();
		self.origin = OriginKind::Table;
		self.table_name = Some(target.name.clone());
		self.schema = target.schema.clone();
		self.context = Some(context);
		let fingerprint = self.snapshot.as_ref().map(|s| s.fingerprint);
		self.synced = Some(self.sync_point(fingerprint));

		info!(table = %target, context = %key, "Dataset uploaded");
		Ok(())
	}

	async fn push(&self, context: &SharedContext, target: &TableRef, if_exists: IfExists) -> Result<()> {
		if let Some(snapshot) = &self.snapshot {
			context.write_table(target, &snapshot.table, if_exists).await?;
			return Ok(());
		}

		match (self.origin, &self.query, self.table_ref()) {
			(OriginKind::Query, Some(query), _) => {
				context.create_table_as(target, query, if_exists).await?;
			}
			(OriginKind::Table, _, Some(source)) => {
				let own = self.context.clone().unwrap_or_else(|| context.clone());
				if own.key() != context.key() {
					let table = own.query(&source.select_all()).await?;
					context
						.write_table(target, &table.without_columns(&[WEBMERCATOR_COLUMN]), if_exists)
						.await?;
				} else if source == *target {
					debug!(table = %target, "Upload target is the source table");
					if if_exists == IfExists::Fail {
						return Err(ContextError::TableExists(target.to_string()).into());
					}
				} else {
					context.create_table_as(target, &source.select_all(), if_exists).await?;
				}
			}
			_ => return Err(DatasetError::EmptyDataset),
		}
		Ok(())
	}

	/// Whether the named remote table exists.
	pub async fn exists(&self) -> Result<bool> {
		let (context, target) = self.remote_table("check existence of")?;
		Ok(context.table_exists(&target).await?)
	}

	/// Drops the remote table, returning whether it existed.
	///
	/// The dataset is out of sync afterwards.
	pub async fn delete(&mut self) -> Result<bool> {
		let (context, target) = self.remote_table("delete")?;
		let existed = context.drop_table(&target).await?;
		self.synced = None;

		info!(table = %target, existed, "Dataset table deleted");
		Ok(existed)
	}

	fn remote_table(&self, operation: &'static str) -> Result<(SharedContext, TableRef)> {
		let target = match (self.origin, self.table_ref()) {
			(OriginKind::Table, Some(target)) => target,
			(origin, _) => return Err(DatasetError::InvalidOrigin { origin, operation }),
		};
		let context = self.context.clone().ok_or(DatasetError::MissingContext)?;
		Ok((context, target))
	}

	fn current_sync_point(&self) -> SyncPoint {
		self.sync_point(self.snapshot.as_ref().map(|s| s.fingerprint))
	}

	fn sync_point(&self, fingerprint: Option<TableFingerprint>) -> SyncPoint {
		SyncPoint {
			table_name: self.table_name.clone(),
			schema: self.schema.clone(),
			context: self.context.as_ref().map(|ctx| ctx.key()),
			fingerprint,
		}
	}
}
