// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mapsync_dataset::{
	ApiKey, Context, Credentials, Dataset, MemoryContext, OriginKind, SharedContext, SqlApiContext, Table, TableRef,
};
use mapsync_publish::{
	Layer, Map, Privacy, Publication, PublicationApi, PublishError, Publisher, Result,
};
use serde_json::json;

fn table(value: i64) -> Table {
	Table::from_columns([("column_name", vec![json!(value)])]).unwrap()
}

fn memory(name: &str) -> MemoryContext {
	MemoryContext::builder(name)
		.table(TableRef::new("public", "stores"), table(1))
		.build()
}

fn shared(ctx: &MemoryContext) -> SharedContext {
	Arc::new(ctx.clone())
}

fn mixed_map(ctx: &MemoryContext) -> Map {
	Map::new(vec![
		Layer::new(Dataset::from_table("stores", shared(ctx))),
		Layer::new(Dataset::from_dataframe(table(2))),
		Layer::new(Dataset::from_dataframe(table(3))),
	])
}

#[derive(Default)]
struct FakeApi {
	response: Publication,
	calls: Mutex<Vec<(String, Option<String>)>>,
}

#[async_trait]
impl PublicationApi for FakeApi {
	async fn create(&self, _html: &str, name: &str, password: Option<&str>) -> Result<Publication> {
		if let Ok(mut calls) = self.calls.lock() {
			calls.push((name.to_string(), password.map(str::to_string)));
		}
		Ok(self.response.clone())
	}
}

#[test]
fn is_sync_requires_every_layer() {
	let ctx = memory("test");
	let synced = Map::new(vec![Layer::new(Dataset::from_table("stores", shared(&ctx)))]);
	assert!(Publisher::new(&synced, None).is_sync());
	assert!(!Publisher::new(&mixed_map(&ctx), None).is_sync());
}

#[tokio::test]
async fn sync_layers_uploads_unsynced_layers() {
	let ctx = memory("test");
	let map = mixed_map(&ctx);
	let mut publisher = Publisher::new(&map, Some(shared(&ctx)));

	let created = publisher.sync_layers("My Map", None).await.unwrap();

	assert_eq!(created, vec!["my_map_2".to_string(), "my_map_3".to_string()]);
	assert!(publisher.is_sync());
	assert_eq!(ctx.table(&TableRef::new("public", "my_map_3")).await, Some(table(3)));

	let layers = publisher.layers(ApiKey::new("default_public"));
	assert!(matches!(layers, Err(PublishError::MissingCredentials)));

	// The source map keeps its original layers.
	assert_eq!(map.layers()[1].source().dataset().origin(), OriginKind::Dataframe);
}

#[tokio::test]
async fn explicit_context_wins_over_layer_context() {
	let own = memory("own");
	let explicit = MemoryContext::builder("explicit")
		.query_result("SELECT 1", table(1))
		.build();
	let map = Map::new(vec![Layer::new(Dataset::from_query("SELECT 1", shared(&own)))]);

	let mut publisher = Publisher::new(&map, None);
	publisher.sync_layers("map", Some(shared(&explicit))).await.unwrap();

	let target = TableRef::new("public", "map_1");
	assert!(publisher.is_sync());
	assert!(explicit.table(&target).await.is_some());
	assert!(own.table(&target).await.is_none());
}

#[tokio::test]
async fn sync_layers_without_context_fails() {
	let map = Map::new(vec![Layer::new(Dataset::from_dataframe(table(1)))]);
	let mut publisher = Publisher::new(&map, None);

	assert!(matches!(
		publisher.sync_layers("map", None).await,
		Err(PublishError::MissingContext)
	));
}

#[test]
fn layers_attach_source_credentials() {
	let credentials = Credentials::new("alice", ApiKey::new("master")).unwrap();
	let ctx: SharedContext = Arc::new(SqlApiContext::builder().credentials(credentials).build().unwrap());
	let map = Map::new(vec![Layer::new(Dataset::from_dataframe(table(1)))]);
	let mut publisher = Publisher::new(&map, Some(ctx.clone()));

	let layers = publisher.layers(ApiKey::new("maps_key")).unwrap();
	let source = layers[0].source();
	let source_credentials = source.credentials().unwrap();

	assert_eq!(source_credentials.username, "alice");
	assert_eq!(source_credentials.api_key.expose(), "maps_key");
	assert_eq!(source_credentials.base_url.as_str(), "https://alice.carto.com/");
	assert_eq!(source.dataset().context().map(|c| c.key()), Some(ctx.key()));
}

#[tokio::test]
async fn publish_validates_result() {
	let api = FakeApi {
		response: Publication {
			id: Some("a1".to_string()),
			url: Some("https://alice.carto.com/kuviz/a1".to_string()),
			name: Some("stores".to_string()),
			privacy: Some("password".to_string()),
		},
		..Default::default()
	};

	let publisher = Publisher::new(&Map::default(), None);
	let published = publisher
		.publish(&api, "<html></html>", "stores", Some("secret"))
		.await
		.unwrap();

	assert_eq!(published.id, "a1");
	assert_eq!(published.privacy, Privacy::Password);
	assert_eq!(
		api.calls.lock().unwrap().as_slice(),
		&[("stores".to_string(), Some("secret".to_string()))]
	);
}

#[tokio::test]
async fn publish_rejects_incomplete_result() {
	let api = FakeApi::default();
	let publisher = Publisher::new(&Map::default(), None);

	assert!(matches!(
		publisher.publish(&api, "<html></html>", "stores", None).await,
		Err(PublishError::InvalidPublication(_))
	));
}
