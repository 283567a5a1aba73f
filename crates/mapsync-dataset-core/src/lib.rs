// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for mapsync datasets.
//!
//! This crate holds everything about datasets that does not talk to the
//! network:
//! - [`Table`]: in-memory snapshots with structural equality and content
//!   fingerprints
//! - [`OriginKind`] and [`TableRef`]: where data comes from and how remote
//!   tables are addressed
//! - [`sql`]: statement generation for the hosted store
//! - [`normalize_name`]: table name normalization
//! - [`table_from_geojson`]: GeoJSON conversion

pub mod error;
pub mod geojson;
pub mod naming;
pub mod origin;
pub mod sql;
pub mod table;

pub use error::{CoreError, Result};
pub use geojson::{table_from_geojson, table_from_geojson_str, GEOMETRY_COLUMN};
pub use naming::{normalize_name, MAX_IDENTIFIER_LEN};
pub use origin::{OriginKind, TableRef, DEFAULT_SCHEMA};
pub use table::{is_geometry, Column, ColumnType, Table, TableFingerprint};
