// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory tabular snapshots.
//!
//! A [`Table`] is the local side of a dataset: ordered, typed columns and
//! row-major JSON values. Equality is structural, and [`Table::fingerprint`]
//! gives a content hash that sync tracking compares instead of keeping a
//! second copy of the data around.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};

const GEOMETRY_TYPES: &[&str] = &[
	"Point",
	"MultiPoint",
	"LineString",
	"MultiLineString",
	"Polygon",
	"MultiPolygon",
	"GeometryCollection",
];

/// Returns true if `value` is a GeoJSON geometry object.
pub fn is_geometry(value: &Value) -> bool {
	let Some(object) = value.as_object() else {
		return false;
	};

	match object.get("type").and_then(Value::as_str) {
		Some("GeometryCollection") => object.get("geometries").is_some_and(Value::is_array),
		Some(kind) if GEOMETRY_TYPES.contains(&kind) => object.get("coordinates").is_some_and(Value::is_array),
		_ => false,
	}
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
	Boolean,
	Integer,
	Float,
	Text,
	Geometry,
	Json,
}

impl ColumnType {
	/// Infers a column type from its values. Nulls are ignored; an all-null
	/// or empty column is treated as text.
	pub fn infer<'a, I>(values: I) -> Self
	where
		I: IntoIterator<Item = &'a Value>,
	{
		let mut inferred: Option<ColumnType> = None;

		for value in values {
			let kind = match value {
				Value::Null => continue,
				Value::Bool(_) => ColumnType::Boolean,
				Value::Number(n) if n.is_f64() => ColumnType::Float,
				Value::Number(_) => ColumnType::Integer,
				Value::String(_) => ColumnType::Text,
				v if is_geometry(v) => ColumnType::Geometry,
				_ => ColumnType::Json,
			};

			inferred = Some(match (inferred, kind) {
				(None, kind) => kind,
				(Some(current), kind) if current == kind => current,
				(Some(ColumnType::Integer), ColumnType::Float)
				| (Some(ColumnType::Float), ColumnType::Integer) => ColumnType::Float,
				_ => ColumnType::Json,
			});
		}

		inferred.unwrap_or(ColumnType::Text)
	}

	/// Maps a field type reported by the hosted SQL API.
	pub fn from_sql_api(name: &str) -> Self {
		match name {
			"number" => ColumnType::Float,
			"string" | "date" => ColumnType::Text,
			"boolean" => ColumnType::Boolean,
			"geometry" => ColumnType::Geometry,
			_ => ColumnType::Json,
		}
	}

	/// Postgres type used when creating a remote table.
	pub fn sql_type(&self) -> &'static str {
		match self {
			ColumnType::Boolean => "boolean",
			ColumnType::Integer => "bigint",
			ColumnType::Float => "double precision",
			ColumnType::Text => "text",
			ColumnType::Geometry => "geometry(Geometry, 4326)",
			ColumnType::Json => "jsonb",
		}
	}
}

impl fmt::Display for ColumnType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ColumnType::Boolean => "boolean",
			ColumnType::Integer => "integer",
			ColumnType::Float => "float",
			ColumnType::Text => "text",
			ColumnType::Geometry => "geometry",
			ColumnType::Json => "json",
		};
		f.write_str(name)
	}
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
	pub name: String,
	pub kind: ColumnType,
}

impl Column {
	pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
		Self {
			name: name.into(),
			kind,
		}
	}
}

/// SHA-256 digest of a table's columns and values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableFingerprint(pub [u8; 32]);

impl TableFingerprint {
	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}
}

impl fmt::Display for TableFingerprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

impl fmt::Debug for TableFingerprint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TableFingerprint({})", &self.to_hex()[..12])
	}
}

/// Row-major in-memory table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
	columns: Vec<Column>,
	rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawTable {
	columns: Vec<Column>,
	rows: Vec<Vec<Value>>,
}

impl TryFrom<RawTable> for Table {
	type Error = CoreError;

	fn try_from(raw: RawTable) -> Result<Self> {
		Table::from_rows(raw.columns, raw.rows)
	}
}

impl Table {
	/// Creates an empty table with the given columns.
	pub fn new(columns: Vec<Column>) -> Result<Self> {
		check_unique(&columns)?;
		Ok(Self {
			columns,
			rows: Vec::new(),
		})
	}

	/// Builds a table from named columns of values, inferring column types.
	///
	/// ```
	/// use mapsync_dataset_core::Table;
	/// use serde_json::json;
	///
	/// let table = Table::from_columns([("column_name", vec![json!(1)])]).unwrap();
	/// assert_eq!(table.num_rows(), 1);
	/// ```
	pub fn from_columns<I, S>(columns: I) -> Result<Self>
	where
		I: IntoIterator<Item = (S, Vec<Value>)>,
		S: Into<String>,
	{
		let columns: Vec<(String, Vec<Value>)> = columns
			.into_iter()
			.map(|(name, values)| (name.into(), values))
			.collect();

		let expected = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
		if let Some((name, values)) = columns.iter().find(|(_, values)| values.len() != expected) {
			return Err(CoreError::ColumnLengthMismatch {
				column: name.clone(),
				expected,
				found: values.len(),
			});
		}

		let schema: Vec<Column> = columns
			.iter()
			.map(|(name, values)| Column::new(name.clone(), ColumnType::infer(values)))
			.collect();
		check_unique(&schema)?;

		let mut rows: Vec<Vec<Value>> = (0..expected).map(|_| Vec::with_capacity(columns.len())).collect();
		for (_, values) in columns {
			for (row, value) in rows.iter_mut().zip(values) {
				row.push(value);
			}
		}

		Ok(Self {
			columns: schema,
			rows,
		})
	}

	/// Builds a table from an explicit schema and rows.
	pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
		let mut table = Self::new(columns)?;
		for row in rows {
			table.push_row(row)?;
		}
		Ok(table)
	}

	/// Appends a row; its arity must match the column count.
	pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
		if row.len() != self.columns.len() {
			return Err(CoreError::RowArity {
				expected: self.columns.len(),
				found: row.len(),
			});
		}
		self.rows.push(row);
		Ok(())
	}

	pub fn columns(&self) -> &[Column] {
		&self.columns
	}

	pub fn rows(&self) -> &[Vec<Value>] {
		&self.rows
	}

	pub fn num_rows(&self) -> usize {
		self.rows.len()
	}

	pub fn num_columns(&self) -> usize {
		self.columns.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn column_index(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|c| c.name == name)
	}

	/// Values of the named column, in row order.
	pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
		let idx = self.column_index(name)?;
		Some(self.rows.iter().map(|row| &row[idx]).collect())
	}

	/// Returns a copy without the named columns. Unknown names are ignored.
	pub fn without_columns(&self, names: &[&str]) -> Table {
		let keep: Vec<usize> = self
			.columns
			.iter()
			.enumerate()
			.filter(|(_, c)| !names.contains(&c.name.as_str()))
			.map(|(i, _)| i)
			.collect();

		Table {
			columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
			rows: self
				.rows
				.iter()
				.map(|row| keep.iter().map(|&i| row[i].clone()).collect())
				.collect(),
		}
	}

	/// Content hash over column names, column types and every value.
	///
	/// Fields are length-prefixed so that adjacent values cannot run into
	/// each other and collide. Object keys are hashed in sorted order, since
	/// equal tables may hold the same object with its keys in another order.
	pub fn fingerprint(&self) -> TableFingerprint {
		let mut hasher = Sha256::new();

		hasher.update((self.columns.len() as u64).to_le_bytes());
		for column in &self.columns {
			update_field(&mut hasher, column.name.as_bytes());
			update_field(&mut hasher, column.kind.to_string().as_bytes());
		}

		hasher.update((self.rows.len() as u64).to_le_bytes());
		for row in &self.rows {
			for value in row {
				update_value(&mut hasher, value);
			}
		}

		TableFingerprint(hasher.finalize().into())
	}
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
	hasher.update((bytes.len() as u64).to_le_bytes());
	hasher.update(bytes);
}

fn update_value(hasher: &mut Sha256, value: &Value) {
	match value {
		Value::Array(items) => {
			hasher.update(b"[");
			hasher.update((items.len() as u64).to_le_bytes());
			for item in items {
				update_value(hasher, item);
			}
		}
		Value::Object(object) => {
			let mut entries: Vec<(&String, &Value)> = object.iter().collect();
			entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

			hasher.update(b"{");
			hasher.update((entries.len() as u64).to_le_bytes());
			for (key, item) in entries {
				update_field(hasher, key.as_bytes());
				update_value(hasher, item);
			}
		}
		scalar => {
			hasher.update(b"s");
			update_field(hasher, scalar.to_string().as_bytes());
		}
	}
}

fn check_unique(columns: &[Column]) -> Result<()> {
	let mut seen = HashSet::new();
	for column in columns {
		if !seen.insert(column.name.as_str()) {
			return Err(CoreError::DuplicateColumn(column.name.clone()));
		}
	}
	Ok(())
}
