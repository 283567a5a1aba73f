// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry logic with exponential backoff for HTTP requests.

use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

/// Backoff policy for requests against the hosted platform.
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts including the first one. `1` disables retries.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A policy that performs a single attempt.
	pub fn no_retry() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}
}

/// Errors that know whether repeating the request can help.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;

	/// Server supplied wait hint (e.g. `Retry-After`), if any.
	fn retry_after(&self) -> Option<Duration> {
		None
	}
}

/// Statuses that indicate a transient condition on the server side.
pub fn is_retryable_status(status: StatusCode) -> bool {
	matches!(
		status,
		StatusCode::TOO_MANY_REQUESTS
			| StatusCode::REQUEST_TIMEOUT
			| StatusCode::INTERNAL_SERVER_ERROR
			| StatusCode::BAD_GATEWAY
			| StatusCode::SERVICE_UNAVAILABLE
			| StatusCode::GATEWAY_TIMEOUT
	)
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}

		self.status().map(is_retryable_status).unwrap_or(false)
	}
}

fn calculate_delay(cfg: &RetryConfig, attempt: u32, hint: Option<Duration>) -> Duration {
	let exponential_delay = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(attempt as i32);
	let capped_delay = exponential_delay.min(cfg.max_delay.as_secs_f64());

	let backoff = if cfg.jitter {
		capped_delay * (0.5 + fastrand::f64())
	} else {
		capped_delay
	};

	// The server hint wins when it asks for a longer wait, still bounded by max_delay.
	let hinted = hint
		.map(|d| d.as_secs_f64().min(cfg.max_delay.as_secs_f64()))
		.unwrap_or(0.0);

	Duration::from_secs_f64(backoff.max(hinted))
}

/// Runs `f` until it succeeds, fails with a non-retryable error, or the
/// attempt budget in `cfg` is spent.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: std::future::Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Display,
{
	let mut attempt = 0;

	loop {
		match f().await {
			Ok(result) => return Ok(result),
			Err(err) => {
				attempt += 1;

				if !err.is_retryable() {
					return Err(err);
				}

				if attempt >= cfg.max_attempts.max(1) {
					warn!(
						error = %err,
						attempt,
						max_attempts = cfg.max_attempts,
						"retry budget exhausted"
					);
					return Err(err);
				}

				let delay = calculate_delay(cfg, attempt - 1, err.retry_after());
				warn!(
					error = %err,
					attempt,
					max_attempts = cfg.max_attempts,
					delay_ms = delay.as_millis() as u64,
					"retrying request"
				);

				tokio::time::sleep(delay).await;
			}
		}
	}
}
