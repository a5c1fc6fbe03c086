// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The event record: one analytics event or user-property update.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::options::TrackOptions;
use crate::properties::Properties;

/// Millisecond-precision timestamp layout used on the wire.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Formats a datetime with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
	Tz: TimeZone,
	Tz::Offset: std::fmt::Display,
{
	at.format(TIMESTAMP_FORMAT).to_string()
}

/// Selects server-side routing for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
	#[serde(rename = "track")]
	Event,
	#[serde(rename = "user")]
	UserUpdate,
}

/// Known user-property verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserUpdate {
	/// Overwrite properties.
	Set,
	/// Set properties only if they are not already present.
	SetOnce,
	/// Add numeric deltas.
	Add,
	/// Keep the smaller of the current and new value.
	Min,
	/// Keep the larger of the current and new value.
	Max,
}

impl UserUpdate {
	pub fn as_str(&self) -> &'static str {
		match self {
			UserUpdate::Set => "user_set",
			UserUpdate::SetOnce => "user_setonce",
			UserUpdate::Add => "user_add",
			UserUpdate::Min => "user_min",
			UserUpdate::Max => "user_max",
		}
	}
}

impl std::fmt::Display for UserUpdate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Values applied when the caller leaves a field unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordDefaults {
	/// Fallback CP partner ID; zero means "not configured".
	pub cp_partner_id: u32,
	/// Fallback platform ID; zero means "not configured".
	pub platform_id: i32,
}

/// One analytics unit as it is encoded on the wire.
///
/// Construct with [`EventRecord::build`], which validates the identifying
/// fields and fills `uuid` and `time` exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
	#[serde(rename = "type")]
	pub kind: RecordKind,
	pub time: String,
	pub distinct_id: String,
	#[serde(rename = "devicecode")]
	pub device_code: String,
	/// Event name, or the user-property verb for [`RecordKind::UserUpdate`].
	pub event: String,
	pub uuid: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub ip: String,
	pub properties: Properties,
	#[serde(rename = "app_id", default, skip_serializing_if = "String::is_empty")]
	pub product_id: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub channel_id: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub sub_channel_id: String,
	#[serde(rename = "cpid")]
	pub cp_id: u32,
	pub platform_id: i32,
}

impl EventRecord {
	/// Validates the subject, name and partner, then enriches the record with
	/// a fresh v4 UUID and the capture time where the caller left them empty.
	///
	/// Nothing is generated when validation fails.
	pub fn build(
		device_code: &str,
		distinct_id: &str,
		options: TrackOptions,
		defaults: &RecordDefaults,
	) -> Result<Self, ValidationError> {
		Self::build_at(device_code, distinct_id, options, defaults, Local::now())
	}

	pub(crate) fn build_at(
		device_code: &str,
		distinct_id: &str,
		options: TrackOptions,
		defaults: &RecordDefaults,
		now: DateTime<Local>,
	) -> Result<Self, ValidationError> {
		if device_code.is_empty() && distinct_id.is_empty() {
			return Err(ValidationError::InvalidSubject);
		}
		if options.name.is_empty() {
			return Err(ValidationError::InvalidEventName);
		}
		let kind = options.kind.ok_or(ValidationError::InvalidKind)?;
		let cp_id = options
			.cp_partner_id
			.filter(|id| *id != 0)
			.unwrap_or(defaults.cp_partner_id);
		if cp_id == 0 {
			return Err(ValidationError::InvalidPartner);
		}

		let uuid = options
			.uuid
			.filter(|u| !u.is_empty())
			.unwrap_or_else(|| Uuid::new_v4().to_string());
		let time = options
			.timestamp
			.filter(|t| !t.is_empty())
			.unwrap_or_else(|| format_timestamp(&now));

		Ok(Self {
			kind,
			time,
			distinct_id: distinct_id.to_string(),
			device_code: device_code.to_string(),
			event: options.name,
			uuid,
			ip: options.ip.unwrap_or_default(),
			properties: options.properties,
			product_id: options.product_id.unwrap_or_default(),
			channel_id: options.channel_id.unwrap_or_default(),
			sub_channel_id: options.sub_channel_id.unwrap_or_default(),
			cp_id,
			platform_id: options.platform_id.unwrap_or(defaults.platform_id),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const DEFAULTS: RecordDefaults = RecordDefaults {
		cp_partner_id: 1000,
		platform_id: 0,
	};

	#[test]
	fn build_fills_uuid_and_time() {
		let record = EventRecord::build("dev-1", "", TrackOptions::event("login"), &DEFAULTS).unwrap();

		assert_eq!(record.kind, RecordKind::Event);
		assert_eq!(record.event, "login");
		assert_eq!(record.cp_id, 1000);
		assert!(Uuid::parse_str(&record.uuid).is_ok());
		assert_eq!(record.time.len(), "2024-01-02 03:04:05.678".len());
	}

	#[test]
	fn build_keeps_caller_uuid_and_time() {
		let options = TrackOptions::event("login")
			.uuid("fixed-uuid")
			.timestamp("2024-01-02 03:04:05.678");
		let record = EventRecord::build("dev-1", "", options, &DEFAULTS).unwrap();

		assert_eq!(record.uuid, "fixed-uuid");
		assert_eq!(record.time, "2024-01-02 03:04:05.678");
	}

	#[test]
	fn build_uses_capture_time() {
		let now = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
		let record =
			EventRecord::build_at("dev", "", TrackOptions::event("e"), &DEFAULTS, now).unwrap();
		assert_eq!(record.time, "2024-05-06 07:08:09.000");
	}

	#[test]
	fn empty_subject_is_rejected() {
		let err = EventRecord::build("", "", TrackOptions::event("login"), &DEFAULTS).unwrap_err();
		assert_eq!(err, ValidationError::InvalidSubject);
	}

	#[test]
	fn distinct_id_alone_is_a_valid_subject() {
		assert!(EventRecord::build("", "user-1", TrackOptions::event("login"), &DEFAULTS).is_ok());
	}

	#[test]
	fn empty_name_is_rejected() {
		let err = EventRecord::build("dev", "", TrackOptions::event(""), &DEFAULTS).unwrap_err();
		assert_eq!(err, ValidationError::InvalidEventName);
	}

	#[test]
	fn missing_partner_is_rejected() {
		let err = EventRecord::build(
			"dev",
			"",
			TrackOptions::event("login"),
			&RecordDefaults::default(),
		)
		.unwrap_err();
		assert_eq!(err, ValidationError::InvalidPartner);
	}

	#[test]
	fn explicit_partner_overrides_default() {
		let record = EventRecord::build(
			"dev",
			"",
			TrackOptions::event("login").cp_partner_id(42),
			&DEFAULTS,
		)
		.unwrap();
		assert_eq!(record.cp_id, 42);
	}

	#[test]
	fn zero_partner_falls_back_to_default() {
		let record = EventRecord::build(
			"dev",
			"",
			TrackOptions::event("login").cp_partner_id(0),
			&DEFAULTS,
		)
		.unwrap();
		assert_eq!(record.cp_id, 1000);
	}

	#[test]
	fn missing_kind_is_rejected() {
		let options = TrackOptions {
			name: "login".to_string(),
			..TrackOptions::default()
		};
		let err = EventRecord::build("dev", "", options, &DEFAULTS).unwrap_err();
		assert_eq!(err, ValidationError::InvalidKind);
	}

	#[test]
	fn user_update_uses_verb_as_name() {
		let record =
			EventRecord::build("dev", "u", TrackOptions::user_update(UserUpdate::SetOnce), &DEFAULTS)
				.unwrap();
		assert_eq!(record.kind, RecordKind::UserUpdate);
		assert_eq!(record.event, "user_setonce");
	}

	#[test]
	fn wire_format_omits_empty_optionals() {
		let options = TrackOptions::event("login")
			.uuid("u-1")
			.timestamp("2024-01-02 03:04:05.678")
			.product_id("app-7")
			.property("level", 3);
		let record = EventRecord::build("dev", "user", options, &DEFAULTS).unwrap();
		let json = serde_json::to_value(&record).unwrap();

		assert_eq!(json["type"], "track");
		assert_eq!(json["devicecode"], "dev");
		assert_eq!(json["distinct_id"], "user");
		assert_eq!(json["cpid"], 1000);
		assert_eq!(json["app_id"], "app-7");
		assert_eq!(json["platform_id"], 0);
		assert_eq!(json["properties"]["level"], 3);
		assert!(json.get("ip").is_none());
		assert!(json.get("channel_id").is_none());
	}

	#[test]
	fn user_kind_serializes_as_user() {
		assert_eq!(
			serde_json::to_value(RecordKind::UserUpdate).unwrap(),
			serde_json::json!("user")
		);
	}

	proptest! {
		#[test]
		fn empty_subject_always_fails(
			name in "[a-z]{0,10}",
			cp in proptest::option::of(any::<u32>()),
			platform in proptest::option::of(any::<i32>()),
		) {
			let mut options = TrackOptions::event(name);
			options.cp_partner_id = cp;
			options.platform_id = platform;
			let result = EventRecord::build("", "", options, &DEFAULTS);
			prop_assert_eq!(result.unwrap_err(), ValidationError::InvalidSubject);
		}

		#[test]
		fn valid_records_carry_required_fields(
			device in "[a-z0-9]{0,8}",
			distinct in "[a-z0-9]{1,8}",
			name in "[a-z_]{1,12}",
		) {
			let record = EventRecord::build(&device, &distinct, TrackOptions::event(name.clone()), &DEFAULTS).unwrap();
			prop_assert_eq!(record.event, name);
			prop_assert!(record.cp_id != 0);
			prop_assert!(!record.uuid.is_empty());
			prop_assert!(!record.time.is_empty());
		}
	}
}
