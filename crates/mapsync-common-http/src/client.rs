// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};

/// Creates a new HTTP client builder with the standard mapsync User-Agent.
///
/// # Example
/// ```ignore
/// let client = mapsync_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Returns the User-Agent sent by every mapsync client.
///
/// Format: `mapsync/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"mapsync/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_product_and_platform() {
		let ua = user_agent();
		assert!(ua.starts_with("mapsync/"));
		assert!(ua.contains(std::env::consts::OS));
		assert!(ua.ends_with(')'));
	}

	#[test]
	fn builder_produces_client() {
		assert!(builder().build().is_ok());
	}
}
