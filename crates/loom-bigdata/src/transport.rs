// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of encoded batches to the collector.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::codec::EncodedBatch;
use crate::config::TransportConfig;
use crate::error::{BigDataError, Result};

/// Collector path for batched records.
pub const TRACK_PATH: &str = "/api/bigdata/track";
/// Header carrying the number of records in the body.
pub const DATA_COUNT_HEADER: &str = "x-data-count";

/// Sends one encoded batch and reports the outcome.
///
/// Returns the HTTP status on success. Errors are classified by
/// [`RetryableError`](loom_common_http::RetryableError): transport failures
/// and non-success statuses are retried by the writer, anything else aborts
/// the flush.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send(&self, batch: &EncodedBatch) -> Result<u16>;
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
	#[serde(default)]
	code: i64,
	#[serde(default)]
	msg: String,
}

/// [`Transport`] that POSTs batches to the collector over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	http_client: Client,
	url: String,
	auth_token: Option<String>,
}

impl HttpTransport {
	pub fn new(config: TransportConfig) -> Result<Self> {
		let base_url = config.base_url.trim_end_matches('/');
		if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
			return Err(BigDataError::InvalidBaseUrl(config.base_url.clone()));
		}

		let http_client = loom_common_http::builder()
			.timeout(config.request_timeout())
			.build()
			.map_err(BigDataError::RequestFailed)?;

		Ok(Self {
			http_client,
			url: format!("{base_url}{TRACK_PATH}"),
			auth_token: config.auth_token,
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn send(&self, batch: &EncodedBatch) -> Result<u16> {
		if batch.record_count == 0 {
			return Ok(reqwest::StatusCode::OK.as_u16());
		}

		let mut request = self
			.http_client
			.post(&self.url)
			.header(CONTENT_TYPE, "application/json")
			.header(DATA_COUNT_HEADER, batch.record_count.to_string())
			.body(batch.body.clone());
		if batch.compressed {
			request = request.header(CONTENT_ENCODING, "gzip");
		}
		if let Some(token) = &self.auth_token {
			request = request.header(AUTHORIZATION, format!("Bearer {token}"));
		}

		let response = request.send().await?;
		let status = response.status().as_u16();
		if !response.status().is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(BigDataError::ServerError { status, message });
		}

		let body = response.bytes().await?;
		if body.is_empty() {
			return Ok(status);
		}
		let parsed: TrackResponse =
			serde_json::from_slice(&body).map_err(|e| BigDataError::Rejected {
				status,
				code: -1,
				message: format!("unreadable response: {e}"),
			})?;
		if parsed.code != 0 {
			return Err(BigDataError::Rejected {
				status,
				code: parsed.code,
				message: parsed.msg,
			});
		}

		debug!(status, count = batch.record_count, "Batch delivered");
		Ok(status)
	}
}
