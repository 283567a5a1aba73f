// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Maps, layers and the sources behind them.

use mapsync_dataset::{ApiKey, Credentials, Dataset, SharedContext};
use url::Url;

/// Credentials a map viewer uses to read a layer's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCredentials {
	pub username: String,
	/// Maps API key with read access to the table.
	pub api_key: ApiKey,
	pub base_url: Url,
}

impl SourceCredentials {
	/// Account details from `credentials` paired with a maps API key.
	pub fn from_account(credentials: &Credentials, maps_api_key: ApiKey) -> Self {
		Self {
			username: credentials.username().to_string(),
			api_key: maps_api_key,
			base_url: credentials.base_url().clone(),
		}
	}
}

/// Data behind a layer.
#[derive(Debug, Clone)]
pub struct Source {
	dataset: Dataset,
	credentials: Option<SourceCredentials>,
}

impl Source {
	pub fn new(dataset: Dataset) -> Self {
		Self {
			dataset,
			credentials: None,
		}
	}

	/// Source over a remote table.
	pub fn from_table(table_name: impl Into<String>, context: SharedContext) -> Self {
		Self::new(Dataset::from_table(table_name, context))
	}

	pub fn dataset(&self) -> &Dataset {
		&self.dataset
	}

	pub fn dataset_mut(&mut self) -> &mut Dataset {
		&mut self.dataset
	}

	pub fn credentials(&self) -> Option<&SourceCredentials> {
		self.credentials.as_ref()
	}

	pub fn set_credentials(&mut self, credentials: Option<SourceCredentials>) {
		self.credentials = credentials;
	}
}

impl From<Dataset> for Source {
	fn from(dataset: Dataset) -> Self {
		Self::new(dataset)
	}
}

#[derive(Debug, Clone)]
pub struct Layer {
	source: Source,
}

impl Layer {
	pub fn new(source: impl Into<Source>) -> Self {
		Self {
			source: source.into(),
		}
	}

	pub fn source(&self) -> &Source {
		&self.source
	}

	pub fn source_mut(&mut self) -> &mut Source {
		&mut self.source
	}

	pub fn set_source(&mut self, source: Source) {
		self.source = source;
	}
}

/// An ordered stack of layers.
#[derive(Debug, Clone, Default)]
pub struct Map {
	layers: Vec<Layer>,
}

impl Map {
	pub fn new(layers: Vec<Layer>) -> Self {
		Self { layers }
	}

	pub fn layers(&self) -> &[Layer] {
		&self.layers
	}

	pub fn push(&mut self, layer: Layer) {
		self.layers.push(layer);
	}
}
