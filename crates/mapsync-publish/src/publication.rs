// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The seam to the hosted publication service and validation of its results.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PublishError, Result};

/// Who can open a published map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
	#[default]
	Public,
	Password,
}

impl fmt::Display for Privacy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Privacy::Public => f.write_str("public"),
			Privacy::Password => f.write_str("password"),
		}
	}
}

/// Raw result reported by the publication service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub privacy: Option<String>,
}

/// A map that was published successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMap {
	pub id: String,
	pub url: Url,
	pub name: String,
	pub privacy: Privacy,
}

impl TryFrom<Publication> for PublishedMap {
	type Error = PublishError;

	fn try_from(publication: Publication) -> Result<Self> {
		let required = |value: Option<String>, field: &str| {
			value
				.filter(|v| !v.trim().is_empty())
				.ok_or_else(|| PublishError::InvalidPublication(format!("missing {field}")))
		};

		let id = required(publication.id, "id")?;
		let url = required(publication.url, "url")?;
		let name = required(publication.name, "name")?;

		let url = Url::parse(&url).map_err(|e| PublishError::InvalidPublication(format!("invalid url: {e}")))?;
		let privacy = match publication.privacy.as_deref() {
			None | Some("") | Some("public") => Privacy::Public,
			Some("password") => Privacy::Password,
			Some(other) => return Err(PublishError::InvalidPublication(format!("invalid privacy '{other}'"))),
		};

		Ok(Self { id, url, name, privacy })
	}
}

/// Creates published maps on the hosted platform.
#[async_trait]
pub trait PublicationApi: Send + Sync {
	async fn create(&self, html: &str, name: &str, password: Option<&str>) -> Result<Publication>;
}
