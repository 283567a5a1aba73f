// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQL text generation for the hosted store.
//!
//! Everything here is pure string building so that the HTTP context and
//! tests agree on the exact statements sent.

use serde_json::Value;

use crate::origin::TableRef;
use crate::table::{ColumnType, Table};

/// Quotes an identifier, doubling embedded double quotes.
pub fn quote_ident(ident: &str) -> String {
	format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quotes a string literal, doubling embedded single quotes.
pub fn quote_literal(text: &str) -> String {
	format!("'{}'", text.replace('\'', "''"))
}

/// Renders a value as a SQL literal for a column of the given type.
pub fn value_literal(value: &Value, kind: ColumnType) -> String {
	match (value, kind) {
		(Value::Null, _) => "NULL".to_string(),
		(Value::Object(_), ColumnType::Geometry) => format!(
			"ST_SetSRID(ST_GeomFromGeoJSON({}), 4326)",
			quote_literal(&value.to_string())
		),
		// The SQL API returns geometries as hex-encoded EWKB.
		(Value::String(hex), ColumnType::Geometry) if is_hex(hex) => {
			format!("ST_GeomFromEWKB(decode({}, 'hex'))", quote_literal(hex))
		}
		(Value::String(wkt), ColumnType::Geometry) => {
			format!("ST_GeomFromText({}, 4326)", quote_literal(wkt))
		}
		(_, ColumnType::Json) => format!("{}::jsonb", quote_literal(&value.to_string())),
		(Value::Bool(b), _) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
		(Value::Number(n), _) => n.to_string(),
		(Value::String(s), _) => quote_literal(s),
		(other, _) => quote_literal(&other.to_string()),
	}
}

fn is_hex(text: &str) -> bool {
	!text.is_empty() && text.len() % 2 == 0 && text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// `CREATE TABLE` statement matching the table's columns.
pub fn create_table(target: &TableRef, table: &Table) -> String {
	let columns: Vec<String> = table
		.columns()
		.iter()
		.map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
		.collect();

	format!("CREATE TABLE {} ({})", target.qualified(), columns.join(", "))
}

/// `CREATE TABLE .. AS (query)` for server side materialization.
pub fn create_table_as(target: &TableRef, query: &str) -> String {
	let query = query.trim().trim_end_matches(';').trim_end();
	format!("CREATE TABLE {} AS ({})", target.qualified(), query)
}

/// Appends the rows of `query` to an existing table.
pub fn insert_from_query(target: &TableRef, query: &str) -> String {
	let query = query.trim().trim_end_matches(';').trim_end();
	format!("INSERT INTO {} SELECT * FROM ({}) AS _source", target.qualified(), query)
}

pub fn drop_table_if_exists(target: &TableRef) -> String {
	format!("DROP TABLE IF EXISTS {}", target.qualified())
}

/// Counts matching tables; the result has a single `n` column.
pub fn table_exists(target: &TableRef) -> String {
	format!(
		"SELECT COUNT(*) AS n FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
		quote_literal(&target.schema),
		quote_literal(&target.name)
	)
}

/// Registers a freshly created table with the hosted platform.
pub fn cartodbfy(target: &TableRef) -> String {
	format!(
		"SELECT CDB_CartodbfyTable({}, {})",
		quote_literal(&target.schema),
		quote_literal(&target.name)
	)
}

/// `INSERT` statements covering every row, `batch_rows` rows per statement.
///
/// Returns no statements for an empty table.
pub fn insert_batches(target: &TableRef, table: &Table, batch_rows: usize) -> Vec<String> {
	if table.num_columns() == 0 {
		return Vec::new();
	}

	let column_list: Vec<String> = table.columns().iter().map(|c| quote_ident(&c.name)).collect();
	let column_list = column_list.join(", ");

	table
		.rows()
		.chunks(batch_rows.max(1))
		.map(|chunk| {
			let values: Vec<String> = chunk
				.iter()
				.map(|row| {
					let literals: Vec<String> = row
						.iter()
						.zip(table.columns())
						.map(|(value, column)| value_literal(value, column.kind))
						.collect();
					format!("({})", literals.join(", "))
				})
				.collect();

			format!(
				"INSERT INTO {} ({}) VALUES {}",
				target.qualified(),
				column_list,
				values.join(", ")
			)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::origin::DEFAULT_SCHEMA;
	use serde_json::json;

	fn target() -> TableRef {
		TableRef::new(DEFAULT_SCHEMA, "stores")
	}

	#[test]
	fn literals_escape_quotes() {
		assert_eq!(quote_literal("o'brien"), "'o''brien'");
		assert_eq!(value_literal(&json!("o'brien"), ColumnType::Text), "'o''brien'");
	}

	#[test]
	fn scalar_literals() {
		assert_eq!(value_literal(&Value::Null, ColumnType::Integer), "NULL");
		assert_eq!(value_literal(&json!(true), ColumnType::Boolean), "TRUE");
		assert_eq!(value_literal(&json!(42), ColumnType::Integer), "42");
		assert_eq!(value_literal(&json!(1.5), ColumnType::Float), "1.5");
	}

	#[test]
	fn geometry_literals() {
		let point = json!({"type": "Point", "coordinates": [1.0, 2.0]});
		let sql = value_literal(&point, ColumnType::Geometry);
		assert!(sql.starts_with("ST_SetSRID(ST_GeomFromGeoJSON('{"));
		assert!(sql.ends_with("'), 4326)"));

		let wkt = value_literal(&json!("POINT(1 2)"), ColumnType::Geometry);
		assert_eq!(wkt, "ST_GeomFromText('POINT(1 2)', 4326)");

		let ewkb = value_literal(&json!("0101000020E6100000"), ColumnType::Geometry);
		assert_eq!(ewkb, "ST_GeomFromEWKB(decode('0101000020E6100000', 'hex'))");
	}

	#[test]
	fn insert_from_query_wraps_source() {
		assert_eq!(
			insert_from_query(&target(), "SELECT 1;"),
			r#"INSERT INTO "public"."stores" SELECT * FROM (SELECT 1) AS _source"#
		);
	}

	#[test]
	fn json_literal_is_cast() {
		assert_eq!(value_literal(&json!({"a": 1}), ColumnType::Json), r#"'{"a":1}'::jsonb"#);
	}

	#[test]
	fn create_table_uses_column_types() {
		let table = Table::from_columns([("id", vec![json!(1)]), ("name", vec![json!("x")])]).unwrap();
		assert_eq!(
			create_table(&target(), &table),
			r#"CREATE TABLE "public"."stores" ("id" bigint, "name" text)"#
		);
	}

	#[test]
	fn create_table_as_strips_trailing_semicolon() {
		assert_eq!(
			create_table_as(&target(), "SELECT 1;  "),
			r#"CREATE TABLE "public"."stores" AS (SELECT 1)"#
		);
	}

	#[test]
	fn inserts_are_batched() {
		let table = Table::from_columns([("id", (1..=5).map(|i| json!(i)).collect::<Vec<_>>())]).unwrap();
		let statements = insert_batches(&target(), &table, 2);

		assert_eq!(statements.len(), 3);
		assert_eq!(
			statements[0],
			r#"INSERT INTO "public"."stores" ("id") VALUES (1), (2)"#
		);
		assert_eq!(statements[2], r#"INSERT INTO "public"."stores" ("id") VALUES (5)"#);
	}

	#[test]
	fn empty_table_has_no_inserts() {
		let table = Table::from_columns([("id", Vec::<Value>::new())]).unwrap();
		assert!(insert_batches(&target(), &table, 10).is_empty());
	}

	#[test]
	fn existence_check_quotes_literals() {
		let sql = table_exists(&TableRef::new("public", "it's"));
		assert!(sql.ends_with("table_name = 'it''s'"));
	}
}
