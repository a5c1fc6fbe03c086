// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pipeline and transport configuration.

use std::time::Duration;

use loom_bigdata_core::RecordDefaults;
use loom_common_http::RetryConfig;
use serde::Deserialize;

/// Delivery attempts made by a single flush.
pub const DELIVERY_ATTEMPTS: u32 = 3;

pub const DEFAULT_CACHE_CAPACITY: usize = 2000;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_AUTO_FLUSH_INTERVAL_SECS: u64 = 30;

/// Configuration for the producer and its batching writer.
///
/// Every field has a default, so the struct can be embedded in a larger
/// TOML or JSON document and only the interesting keys set:
///
/// ```toml
/// [bigdata]
/// cp_partner_id = 1000049
/// auto_flush = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BigDataConfig {
	/// Maximum records retained across failed deliveries. Oldest are dropped
	/// beyond this bound.
	pub cache_capacity: usize,
	/// Maximum records per delivery attempt, and the staging flush trigger.
	pub batch_size: usize,
	/// Cadence of the background flush task.
	pub auto_flush_interval_secs: u64,
	/// Whether the background flush task runs at all.
	pub auto_flush: bool,
	/// Send batches uncompressed.
	pub disable_compress: bool,
	/// CP partner ID applied when a record does not carry one. Zero is unset.
	pub cp_partner_id: u32,
	/// Platform ID applied when a record does not carry one. Zero is unset.
	pub platform_id: i32,
}

impl Default for BigDataConfig {
	fn default() -> Self {
		Self {
			cache_capacity: DEFAULT_CACHE_CAPACITY,
			batch_size: DEFAULT_BATCH_SIZE,
			auto_flush_interval_secs: DEFAULT_AUTO_FLUSH_INTERVAL_SECS,
			auto_flush: false,
			disable_compress: false,
			cp_partner_id: 0,
			platform_id: 0,
		}
	}
}

impl BigDataConfig {
	/// Replaces zero sizes and intervals with their defaults.
	pub fn validated(mut self) -> Self {
		if self.batch_size == 0 {
			self.batch_size = DEFAULT_BATCH_SIZE;
		}
		if self.cache_capacity == 0 {
			self.cache_capacity = DEFAULT_CACHE_CAPACITY;
		}
		if self.auto_flush_interval_secs == 0 {
			self.auto_flush_interval_secs = DEFAULT_AUTO_FLUSH_INTERVAL_SECS;
		}
		self
	}

	pub fn auto_flush_interval(&self) -> Duration {
		Duration::from_secs(self.auto_flush_interval_secs)
	}

	pub fn compress(&self) -> bool {
		!self.disable_compress
	}

	pub fn record_defaults(&self) -> RecordDefaults {
		RecordDefaults {
			cp_partner_id: self.cp_partner_id,
			platform_id: self.platform_id,
		}
	}

	/// Retry schedule used by each flush: immediate re-attempts.
	pub fn retry_config(&self) -> RetryConfig {
		RetryConfig::immediate(DELIVERY_ATTEMPTS)
	}
}

/// Configuration for [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
	/// Server root, e.g. `https://loom.example.com`.
	pub base_url: String,
	/// Optional bearer token sent as `Authorization`.
	#[serde(default)]
	pub auth_token: Option<String>,
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
	10
}

impl TransportConfig {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			auth_token: None,
			request_timeout_secs: default_request_timeout_secs(),
		}
	}

	pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
		self.auth_token = Some(token.into());
		self
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}
