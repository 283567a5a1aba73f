// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dataset synchronization between local tables and hosted SQL tables.
//!
//! A [`Dataset`] wraps a remote table, a remote query, a local [`Table`] or
//! GeoJSON, and tracks whether it still mirrors a remote table through
//! [`Dataset::is_sync`]. Remote access goes through a [`Context`]:
//! [`SqlApiContext`] for the hosted SQL API and [`MemoryContext`] for an
//! in-process store.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mapsync_dataset::{load_credentials, Dataset, SqlApiContext};
//!
//! let ctx = Arc::new(SqlApiContext::builder().credentials(load_credentials()?).build()?);
//! let mut dataset = Dataset::from_query("SELECT * FROM stores WHERE open", ctx);
//! dataset.upload("open_stores", None).await?;
//! assert!(dataset.is_sync());
//! ```

pub mod config;
pub mod context;
pub mod credentials;
pub mod dataset;
pub mod error;
pub mod memory;
pub mod sql_api;

pub use config::{
	credentials_path, load_credentials, load_credentials_from, save_credentials, CredentialsFile, SqlApiConfig,
};
pub use context::{Context, ContextKey, IfExists, SharedContext};
pub use credentials::{ApiKey, Credentials};
pub use dataset::{Dataset, UploadOptions, WEBMERCATOR_COLUMN};
pub use error::{ConfigError, ContextError, DatasetError, Result};
pub use mapsync_dataset_core::{normalize_name, OriginKind, Table, TableRef};
pub use memory::{MemoryContext, MemoryContextBuilder};
pub use sql_api::{SqlApiContext, SqlApiContextBuilder};
