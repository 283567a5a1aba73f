// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Where a dataset's data comes from and how remote tables are addressed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sql::quote_ident;

/// Schema used when neither the caller nor the context names one.
pub const DEFAULT_SCHEMA: &str = "public";

/// How a dataset's data was first obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
	/// A named remote table.
	Table,
	/// The result of a remote SQL query.
	Query,
	/// A local in-memory table.
	Dataframe,
	/// A local table built from GeoJSON.
	Geojson,
}

impl OriginKind {
	/// Whether the origin references data that lives on the remote store.
	pub fn is_remote(&self) -> bool {
		matches!(self, OriginKind::Table | OriginKind::Query)
	}
}

impl fmt::Display for OriginKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OriginKind::Table => "table",
			OriginKind::Query => "query",
			OriginKind::Dataframe => "dataframe",
			OriginKind::Geojson => "geojson",
		};
		f.write_str(name)
	}
}

/// Fully qualified remote table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
	pub schema: String,
	pub name: String,
}

impl TableRef {
	pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			schema: schema.into(),
			name: name.into(),
		}
	}

	/// Renders `"schema"."name"`.
	pub fn qualified(&self) -> String {
		format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
	}

	/// Renders `SELECT * FROM "schema"."name"`.
	pub fn select_all(&self) -> String {
		format!("SELECT * FROM {}", self.qualified())
	}
}

impl fmt::Display for TableRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.qualified())
	}
}
