// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the big-data pipeline.

use loom_bigdata_core::ValidationError;
use loom_common_http::RetryableError;
use thiserror::Error;

/// Big-data pipeline errors.
#[derive(Debug, Error)]
pub enum BigDataError {
	/// The record was refused before any I/O.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// The producer has begun shutting down.
	#[error("producer already shut down")]
	ProducerShutdown,

	/// The writer has been closed.
	#[error("writer has been closed")]
	WriterClosed,

	/// `init` was called more than once on the same writer.
	#[error("writer already started")]
	AlreadyStarted,

	/// The producer was built without a transport.
	#[error("no transport configured")]
	MissingTransport,

	/// Base URL is missing or invalid.
	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),

	/// The request never produced a usable response (DNS, connect, timeout).
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The server answered with a non-success status.
	#[error("server error ({status}): {message}")]
	ServerError { status: u16, message: String },

	/// The server accepted the request but refused the batch.
	#[error("batch rejected ({status}) [{code}]: {message}")]
	Rejected {
		status: u16,
		code: i64,
		message: String,
	},

	/// Encoding the batch failed.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Compressing the batch failed.
	#[error("compression error: {0}")]
	Compression(#[from] std::io::Error),
}

impl BigDataError {
	/// HTTP status associated with the failure, if the server answered.
	pub fn status(&self) -> Option<u16> {
		match self {
			BigDataError::ServerError { status, .. } | BigDataError::Rejected { status, .. } => {
				Some(*status)
			}
			BigDataError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}
}

impl RetryableError for BigDataError {
	/// Transport failures and non-success statuses are retried; anything the
	/// server positively refused, or that failed locally, is not.
	fn is_retryable(&self) -> bool {
		matches!(
			self,
			BigDataError::RequestFailed(_) | BigDataError::ServerError { .. }
		)
	}
}

/// Result type alias for big-data operations.
pub type Result<T> = std::result::Result<T, BigDataError>;
