// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batched, retrying delivery of big-data analytics records.
//!
//! A [`Producer`] validates and enriches records and hands them to a
//! [`LogWriter`]. The default writer, [`BatchWriter`], stages records in
//! memory, delivers them in batches through a [`Transport`], retries failed
//! batches from a bounded cache and, optionally, flushes on a timer.
//!
//! Delivery is at-least-once and in arrival order. Nothing is persisted:
//! [`Producer::close`] must be awaited before the process exits, and records
//! still cached after its final flush fails are lost.

mod attrs;
mod codec;
mod config;
mod error;
mod producer;
mod transport;
mod writer;

#[cfg(test)]
mod test_support;

pub use attrs::PublicAttrs;
pub use codec::EncodedBatch;
pub use config::{
	BigDataConfig, TransportConfig, DEFAULT_AUTO_FLUSH_INTERVAL_SECS, DEFAULT_BATCH_SIZE,
	DEFAULT_CACHE_CAPACITY, DELIVERY_ATTEMPTS,
};
pub use error::{BigDataError, Result};
pub use producer::{Producer, ProducerBuilder, DEFAULT_SYNC_PLATFORM_ID};
pub use transport::{HttpTransport, Transport, DATA_COUNT_HEADER, TRACK_PATH};
pub use writer::{BatchWriter, LogWriter};

pub use loom_bigdata_core::{
	EventRecord, Properties, RecordKind, TrackOptions, UserUpdate, ValidationError,
};
