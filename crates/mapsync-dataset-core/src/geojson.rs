// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion from GeoJSON documents to tables.

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::table::{is_geometry, Column, ColumnType, Table};

/// Name of the geometry column produced from GeoJSON features.
pub const GEOMETRY_COLUMN: &str = "the_geom";

/// Converts a FeatureCollection, a single Feature, or a bare geometry into a
/// table. Feature properties become columns (first-seen order) followed by
/// the geometry column; properties missing from a feature are null.
pub fn table_from_geojson(document: &Value) -> Result<Table> {
	let kind = document
		.get("type")
		.and_then(Value::as_str)
		.ok_or_else(|| invalid("missing 'type' member"))?;

	let features: Vec<(Option<&Map<String, Value>>, Value)> = match kind {
		"FeatureCollection" => document
			.get("features")
			.and_then(Value::as_array)
			.ok_or_else(|| invalid("FeatureCollection without a 'features' array"))?
			.iter()
			.enumerate()
			.map(|(idx, feature)| parse_feature(feature).map_err(|e| at_index(idx, e)))
			.collect::<Result<_>>()?,
		"Feature" => vec![parse_feature(document)?],
		_ if is_geometry(document) => vec![(None, document.clone())],
		other => return Err(invalid(&format!("unsupported type '{other}'"))),
	};

	let mut names: Vec<&str> = Vec::new();
	for (properties, _) in &features {
		for key in properties.iter().flat_map(|p| p.keys()) {
			if key == GEOMETRY_COLUMN {
				return Err(invalid(&format!("property '{GEOMETRY_COLUMN}' clashes with the geometry column")));
			}
			if !names.contains(&key.as_str()) {
				names.push(key);
			}
		}
	}

	let rows: Vec<Vec<Value>> = features
		.iter()
		.map(|(properties, geometry)| {
			let mut row: Vec<Value> = names
				.iter()
				.map(|name| {
					properties
						.and_then(|p| p.get(*name))
						.cloned()
						.unwrap_or(Value::Null)
				})
				.collect();
			row.push(geometry.clone());
			row
		})
		.collect();

	let mut columns: Vec<Column> = names
		.iter()
		.enumerate()
		.map(|(idx, name)| Column::new(*name, ColumnType::infer(rows.iter().map(|row| &row[idx]))))
		.collect();
	columns.push(Column::new(GEOMETRY_COLUMN, ColumnType::Geometry));

	Table::from_rows(columns, rows)
}

/// Parses GeoJSON text and converts it with [`table_from_geojson`].
pub fn table_from_geojson_str(text: &str) -> Result<Table> {
	let document: Value = serde_json::from_str(text)?;
	table_from_geojson(&document)
}

fn parse_feature(feature: &Value) -> Result<(Option<&Map<String, Value>>, Value)> {
	if feature.get("type").and_then(Value::as_str) != Some("Feature") {
		return Err(invalid("expected a Feature"));
	}

	let geometry = match feature.get("geometry") {
		None | Some(Value::Null) => Value::Null,
		Some(g) if is_geometry(g) => g.clone(),
		Some(_) => return Err(invalid("feature geometry is not a GeoJSON geometry")),
	};

	let properties = match feature.get("properties") {
		None | Some(Value::Null) => None,
		Some(Value::Object(map)) => Some(map),
		Some(_) => return Err(invalid("feature properties must be an object")),
	};

	Ok((properties, geometry))
}

fn invalid(message: &str) -> CoreError {
	CoreError::InvalidGeoJson(message.to_string())
}

fn at_index(idx: usize, err: CoreError) -> CoreError {
	match err {
		CoreError::InvalidGeoJson(message) => CoreError::InvalidGeoJson(format!("feature {idx}: {message}")),
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn point(x: f64, y: f64) -> Value {
		json!({"type": "Point", "coordinates": [x, y]})
	}

	#[test]
	fn feature_collection_becomes_rows() {
		let doc = json!({
			"type": "FeatureCollection",
			"features": [
				{"type": "Feature", "properties": {"name": "a", "pop": 10}, "geometry": point(-3.16, 42.03)},
				{"type": "Feature", "properties": {"name": "b"}, "geometry": point(0.0, 1.0)}
			]
		});

		let table = table_from_geojson(&doc).unwrap();
		let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();

		assert_eq!(names, vec!["name", "pop", GEOMETRY_COLUMN]);
		assert_eq!(table.num_rows(), 2);
		assert_eq!(table.rows()[1][1], Value::Null);
		assert_eq!(table.columns()[1].kind, ColumnType::Integer);
		assert_eq!(table.columns()[2].kind, ColumnType::Geometry);
	}

	#[test]
	fn feature_without_properties() {
		let doc = json!({
			"type": "FeatureCollection",
			"features": [{"type": "Feature", "properties": {}, "geometry": point(-3.1640625, 42.032974332441405)}]
		});

		let table = table_from_geojson(&doc).unwrap();
		assert_eq!(table.num_columns(), 1);
		assert_eq!(table.rows()[0][0], point(-3.1640625, 42.032974332441405));
	}

	#[test]
	fn bare_geometry_is_one_row() {
		let table = table_from_geojson(&point(1.0, 2.0)).unwrap();
		assert_eq!(table.num_rows(), 1);
		assert_eq!(table.columns()[0].name, GEOMETRY_COLUMN);
	}

	#[test]
	fn single_feature_is_accepted() {
		let doc = json!({"type": "Feature", "properties": {"id": 7}, "geometry": null});
		let table = table_from_geojson(&doc).unwrap();
		assert_eq!(table.rows()[0], vec![json!(7), Value::Null]);
	}

	#[test]
	fn rejects_unknown_type() {
		let err = table_from_geojson(&json!({"type": "Topology"})).unwrap_err();
		assert!(matches!(err, CoreError::InvalidGeoJson(_)));
	}

	#[test]
	fn reports_offending_feature_index() {
		let doc = json!({
			"type": "FeatureCollection",
			"features": [
				{"type": "Feature", "properties": {}, "geometry": point(0.0, 0.0)},
				{"type": "Feature", "properties": [], "geometry": point(0.0, 0.0)}
			]
		});

		match table_from_geojson(&doc) {
			Err(CoreError::InvalidGeoJson(message)) => assert!(message.starts_with("feature 1:")),
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[test]
	fn parses_text() {
		let table = table_from_geojson_str(r#"{"type": "Point", "coordinates": [1, 2]}"#).unwrap();
		assert_eq!(table.num_rows(), 1);
		assert!(matches!(table_from_geojson_str("{"), Err(CoreError::Serialization(_))));
	}
}
