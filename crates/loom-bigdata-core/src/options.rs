// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named inputs for building an [`EventRecord`](crate::EventRecord).

use chrono::{DateTime, TimeZone};
use serde_json::Value;

use crate::properties::Properties;
use crate::record::{format_timestamp, RecordKind, UserUpdate};

/// Everything a caller may set on a record besides its subject.
///
/// Unset fields fall back to the producer's configured defaults, or are
/// generated (`uuid`, `timestamp`) when the record is built.
///
/// # Example
///
/// ```
/// use loom_bigdata_core::TrackOptions;
///
/// let options = TrackOptions::event("level_up")
///     .channel_id("appstore")
///     .property("level", 12);
/// assert_eq!(options.name, "level_up");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackOptions {
	pub kind: Option<RecordKind>,
	/// Event name, or user-property verb.
	pub name: String,
	pub cp_partner_id: Option<u32>,
	pub platform_id: Option<i32>,
	pub product_id: Option<String>,
	pub channel_id: Option<String>,
	pub sub_channel_id: Option<String>,
	pub ip: Option<String>,
	pub uuid: Option<String>,
	/// Preformatted timestamp; see [`TIMESTAMP_FORMAT`](crate::TIMESTAMP_FORMAT).
	pub timestamp: Option<String>,
	pub properties: Properties,
}

impl TrackOptions {
	/// Options for an analytics event.
	pub fn event(name: impl Into<String>) -> Self {
		Self {
			kind: Some(RecordKind::Event),
			name: name.into(),
			..Self::default()
		}
	}

	/// Options for a user-property update with a known verb.
	pub fn user_update(verb: UserUpdate) -> Self {
		Self::user_verb(verb.as_str())
	}

	/// Options for a user-property update with an arbitrary verb.
	pub fn user_verb(verb: impl Into<String>) -> Self {
		Self {
			kind: Some(RecordKind::UserUpdate),
			name: verb.into(),
			..Self::default()
		}
	}

	pub fn cp_partner_id(mut self, id: u32) -> Self {
		self.cp_partner_id = Some(id);
		self
	}

	pub fn platform_id(mut self, id: i32) -> Self {
		self.platform_id = Some(id);
		self
	}

	pub fn product_id(mut self, id: impl Into<String>) -> Self {
		self.product_id = Some(id.into());
		self
	}

	pub fn channel_id(mut self, id: impl Into<String>) -> Self {
		self.channel_id = Some(id.into());
		self
	}

	pub fn sub_channel_id(mut self, id: impl Into<String>) -> Self {
		self.sub_channel_id = Some(id.into());
		self
	}

	pub fn ip(mut self, ip: impl Into<String>) -> Self {
		self.ip = Some(ip.into());
		self
	}

	pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
		self.uuid = Some(uuid.into());
		self
	}

	/// Sets a preformatted timestamp string.
	pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
		self.timestamp = Some(timestamp.into());
		self
	}

	/// Sets the timestamp from a datetime.
	pub fn at<Tz>(self, at: &DateTime<Tz>) -> Self
	where
		Tz: TimeZone,
		Tz::Offset: std::fmt::Display,
	{
		self.timestamp(format_timestamp(at))
	}

	/// Replaces all custom properties.
	pub fn properties(mut self, properties: impl Into<Properties>) -> Self {
		self.properties = properties.into();
		self
	}

	/// Adds a single custom property.
	pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.set(key, value);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	#[test]
	fn event_sets_kind_and_name() {
		let options = TrackOptions::event("purchase");
		assert_eq!(options.kind, Some(RecordKind::Event));
		assert_eq!(options.name, "purchase");
		assert!(options.properties.is_empty());
	}

	#[test]
	fn user_update_uses_wire_verb() {
		let options = TrackOptions::user_update(UserUpdate::Add);
		assert_eq!(options.kind, Some(RecordKind::UserUpdate));
		assert_eq!(options.name, "user_add");
	}

	#[test]
	fn setters_populate_fields() {
		let options = TrackOptions::event("e")
			.cp_partner_id(7)
			.platform_id(3)
			.product_id("p")
			.channel_id("c")
			.sub_channel_id("s")
			.ip("10.0.0.1")
			.uuid("u")
			.property("a", 1);

		assert_eq!(options.cp_partner_id, Some(7));
		assert_eq!(options.platform_id, Some(3));
		assert_eq!(options.product_id.as_deref(), Some("p"));
		assert_eq!(options.channel_id.as_deref(), Some("c"));
		assert_eq!(options.sub_channel_id.as_deref(), Some("s"));
		assert_eq!(options.ip.as_deref(), Some("10.0.0.1"));
		assert_eq!(options.uuid.as_deref(), Some("u"));
		assert_eq!(options.properties.len(), 1);
	}

	#[test]
	fn at_formats_with_millis() {
		let at = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap()
			+ chrono::Duration::milliseconds(123);
		let options = TrackOptions::event("e").at(&at);
		assert_eq!(options.timestamp.as_deref(), Some("2023-12-31 23:59:58.123"));
	}
}
