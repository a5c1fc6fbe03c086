// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom big-data event pipeline.
//!
//! This crate holds the data model shared by the producer and the batching
//! writer: the [`EventRecord`] wire unit, the [`TrackOptions`] used to build
//! one, the preset property keys understood by the map-based track API, and
//! the [`AtomicFlag`] used as a shutdown marker.
//!
//! Nothing in here performs I/O.

pub mod error;
pub mod flag;
pub mod options;
pub mod preset;
pub mod properties;
pub mod record;

pub use error::ValidationError;
pub use flag::AtomicFlag;
pub use options::TrackOptions;
pub use preset::{
	PRESET_KEY_CHANNEL_ID, PRESET_KEY_CP_ID, PRESET_KEY_IP, PRESET_KEY_PLATFORM_ID,
	PRESET_KEY_PRODUCT_ID, PRESET_KEY_SUB_CHANNEL_ID, PRESET_KEY_TIME, PRESET_KEY_UUID,
};
pub use properties::Properties;
pub use record::{format_timestamp, EventRecord, RecordDefaults, RecordKind, UserUpdate, TIMESTAMP_FORMAT};
