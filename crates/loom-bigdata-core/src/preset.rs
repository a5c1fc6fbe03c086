// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Preset property keys for the map-based track API.
//!
//! Callers that pass a plain property map can set typed record fields by
//! using these keys. Preset keys are always removed from the map, whether or
//! not their value has the expected type; a wrongly typed value is ignored.

use serde_json::Value;

use crate::options::TrackOptions;
use crate::properties::Properties;
use crate::record::RecordKind;

/// CP partner ID, unsigned 32-bit number.
pub const PRESET_KEY_CP_ID: &str = "$cpid";
/// Platform ID, signed 32-bit number.
pub const PRESET_KEY_PLATFORM_ID: &str = "$platformid";
pub const PRESET_KEY_PRODUCT_ID: &str = "$appid";
pub const PRESET_KEY_CHANNEL_ID: &str = "$channelid";
pub const PRESET_KEY_SUB_CHANNEL_ID: &str = "$subchannelid";
pub const PRESET_KEY_UUID: &str = "$uuid";
/// Preformatted timestamp string.
pub const PRESET_KEY_TIME: &str = "$time";
pub const PRESET_KEY_IP: &str = "$ip";

impl TrackOptions {
	/// Builds options from a property map, lifting preset keys into typed
	/// fields and leaving the remaining entries as custom properties.
	pub fn from_properties(kind: RecordKind, name: impl Into<String>, properties: Properties) -> Self {
		let mut properties = properties;
		let cp_partner_id = take(&mut properties, PRESET_KEY_CP_ID)
			.and_then(|v| v.as_u64())
			.and_then(|v| u32::try_from(v).ok());
		let platform_id = take(&mut properties, PRESET_KEY_PLATFORM_ID)
			.and_then(|v| v.as_i64())
			.and_then(|v| i32::try_from(v).ok());

		Self {
			kind: Some(kind),
			name: name.into(),
			cp_partner_id,
			platform_id,
			product_id: take_string(&mut properties, PRESET_KEY_PRODUCT_ID),
			channel_id: take_string(&mut properties, PRESET_KEY_CHANNEL_ID),
			sub_channel_id: take_string(&mut properties, PRESET_KEY_SUB_CHANNEL_ID),
			ip: take_string(&mut properties, PRESET_KEY_IP),
			uuid: take_string(&mut properties, PRESET_KEY_UUID),
			timestamp: take_string(&mut properties, PRESET_KEY_TIME),
			properties,
		}
	}
}

fn take(properties: &mut Properties, key: &str) -> Option<Value> {
	properties.remove(key)
}

fn take_string(properties: &mut Properties, key: &str) -> Option<String> {
	match take(properties, key) {
		Some(Value::String(s)) if !s.is_empty() => Some(s),
		_ => None,
	}
}
