// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Reasons an event record is refused before it reaches the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// Neither a device code nor a distinct ID was supplied.
	#[error("invalid subject: device code and distinct ID are both empty")]
	InvalidSubject,

	/// The event name (or user-property verb) is empty.
	#[error("invalid event name: must not be empty")]
	InvalidEventName,

	/// No non-zero CP partner ID was supplied or configured.
	#[error("invalid partner: CP partner ID is not set")]
	InvalidPartner,

	/// The record kind was not set on the track options.
	#[error("invalid record kind: must be event or user update")]
	InvalidKind,
}
