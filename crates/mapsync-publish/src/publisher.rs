// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Preparing a map's layers for publication.

use mapsync_dataset::{normalize_name, ApiKey, SharedContext};
use tracing::{debug, info, warn};

use crate::error::{PublishError, Result};
use crate::map::{Layer, Map, Source, SourceCredentials};
use crate::publication::{PublicationApi, PublishedMap};

/// Publishes a copy of a map's layers.
///
/// Layers whose datasets are not in sync with a remote table are uploaded by
/// [`Publisher::sync_layers`] before the map is published.
#[derive(Debug, Clone)]
pub struct Publisher {
	layers: Vec<Layer>,
	context: Option<SharedContext>,
}

impl Publisher {
	/// Copies the layers of `map`; the map itself is left untouched.
	pub fn new(map: &Map, context: Option<SharedContext>) -> Self {
		Self {
			layers: map.layers().to_vec(),
			context,
		}
	}

	pub fn set_context(&mut self, context: Option<SharedContext>) {
		self.context = context;
	}

	pub fn context(&self) -> Option<&SharedContext> {
		self.context.as_ref()
	}

	/// Whether every layer is backed by a synchronized remote table.
	pub fn is_sync(&self) -> bool {
		self.layers.iter().all(|layer| layer.source().dataset().is_sync())
	}

	/// Uploads every layer that is not in sync to `{table_name}_{n}`
	/// (normalized, `n` counting layers from 1) and points the layer at the
	/// new table. Returns the names of the tables created.
	///
	/// The upload context is `context`, else the layer's own, else the
	/// publisher's.
	pub async fn sync_layers(&mut self, table_name: &str, context: Option<SharedContext>) -> Result<Vec<String>> {
		let mut created = Vec::new();

		for (idx, layer) in self.layers.iter_mut().enumerate() {
			if layer.source().dataset().is_sync() {
				debug!(layer = idx + 1, "Layer already in sync");
				continue;
			}

			let name = normalize_name(&format!("{table_name}_{}", idx + 1));
			let layer_context = context
				.clone()
				.or_else(|| layer.source().dataset().context().cloned())
				.or_else(|| self.context.clone())
				.ok_or(PublishError::MissingContext)?;

			layer
				.source_mut()
				.dataset_mut()
				.upload(name.as_str(), Some(layer_context.clone()))
				.await?;
			layer.set_source(Source::from_table(name.as_str(), layer_context));

			warn!(
				table = %name,
				"Table created. Publishing the map requires a Maps API key with access to this table"
			);
			created.push(name);
		}

		Ok(created)
	}

	/// Binds every layer to the publisher context and sets the credentials
	/// a viewer will use to read it.
	pub fn layers(&mut self, maps_api_key: ApiKey) -> Result<&[Layer]> {
		let context = self.context.clone().ok_or(PublishError::MissingContext)?;
		let credentials = context.credentials().ok_or(PublishError::MissingCredentials)?;
		let source_credentials = SourceCredentials::from_account(credentials, maps_api_key);

		for layer in &mut self.layers {
			let source = layer.source_mut();
			source.dataset_mut().set_context(Some(context.clone()));
			source.set_credentials(Some(source_credentials.clone()));
		}

		Ok(&self.layers)
	}

	/// Creates the published map and validates what the service returned.
	pub async fn publish<A>(&self, api: &A, html: &str, name: &str, password: Option<&str>) -> Result<PublishedMap>
	where
		A: PublicationApi + ?Sized,
	{
		let publication = api.create(html, name, password).await?;
		let published = PublishedMap::try_from(publication)?;

		info!(
			id = %published.id,
			url = %published.url,
			privacy = %published.privacy,
			"Map published"
		);
		Ok(published)
	}
}
