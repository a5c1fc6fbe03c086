// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire encoding of a batch: a JSON array of records, optionally gzipped.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use loom_bigdata_core::EventRecord;

use crate::error::Result;

/// An encoded batch ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
	pub body: Bytes,
	/// Number of records in `body`.
	pub record_count: usize,
	/// Whether `body` is gzip-compressed.
	pub compressed: bool,
}

impl EncodedBatch {
	/// Encodes `records` as a JSON array, gzipping at best compression when
	/// `compress` is set.
	pub fn encode(records: &[EventRecord], compress: bool) -> Result<Self> {
		let json = serde_json::to_vec(records)?;
		let body = if compress {
			let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::best());
			encoder.write_all(&json)?;
			encoder.finish()?
		} else {
			json
		};

		Ok(Self {
			body: Bytes::from(body),
			record_count: records.len(),
			compressed: compress,
		})
	}

	/// Decodes the body back into records.
	pub fn decode(&self) -> Result<Vec<EventRecord>> {
		if self.compressed {
			let mut json = Vec::new();
			GzDecoder::new(self.body.as_ref()).read_to_end(&mut json)?;
			Ok(serde_json::from_slice(&json)?)
		} else {
			Ok(serde_json::from_slice(&self.body)?)
		}
	}
}
