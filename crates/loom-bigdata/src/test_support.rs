// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use loom_bigdata_core::{EventRecord, RecordDefaults, TrackOptions};

use crate::codec::EncodedBatch;
use crate::error::{BigDataError, Result};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
	Deliver,
	ServerError,
	Rejected,
}

/// Transport whose per-attempt outcome is scripted; falls back to `fallback`
/// once the script runs out.
pub(crate) struct ScriptedTransport {
	script: Mutex<VecDeque<Outcome>>,
	fallback: Mutex<Outcome>,
	attempts: AtomicUsize,
	delivered: Mutex<Vec<Vec<EventRecord>>>,
}

impl ScriptedTransport {
	pub(crate) fn delivering() -> Self {
		Self::scripted(Vec::new(), Outcome::Deliver)
	}

	pub(crate) fn failing() -> Self {
		Self::scripted(Vec::new(), Outcome::ServerError)
	}

	pub(crate) fn scripted(script: Vec<Outcome>, fallback: Outcome) -> Self {
		Self {
			script: Mutex::new(script.into()),
			fallback: Mutex::new(fallback),
			attempts: AtomicUsize::new(0),
			delivered: Mutex::new(Vec::new()),
		}
	}

	pub(crate) fn set_fallback(&self, outcome: Outcome) {
		*self.fallback.lock().unwrap() = outcome;
	}

	pub(crate) fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}

	pub(crate) fn batches(&self) -> Vec<Vec<EventRecord>> {
		self.delivered.lock().unwrap().clone()
	}

	/// Event names of every delivered record, in delivery order.
	pub(crate) fn delivered_names(&self) -> Vec<String> {
		self
			.batches()
			.into_iter()
			.flatten()
			.map(|r| r.event)
			.collect()
	}
}

#[async_trait]
impl Transport for ScriptedTransport {
	async fn send(&self, batch: &EncodedBatch) -> Result<u16> {
		self.attempts.fetch_add(1, Ordering::SeqCst);
		let outcome = self
			.script
			.lock()
			.unwrap()
			.pop_front()
			.unwrap_or_else(|| *self.fallback.lock().unwrap());
		match outcome {
			Outcome::Deliver => {
				let records = batch.decode()?;
				assert_eq!(records.len(), batch.record_count);
				self.delivered.lock().unwrap().push(records);
				Ok(200)
			}
			Outcome::ServerError => Err(BigDataError::ServerError {
				status: 503,
				message: "unavailable".to_string(),
			}),
			Outcome::Rejected => Err(BigDataError::Rejected {
				status: 200,
				code: 1,
				message: "refused".to_string(),
			}),
		}
	}
}

pub(crate) fn record(name: &str) -> EventRecord {
	let defaults = RecordDefaults {
		cp_partner_id: 1,
		platform_id: 0,
	};
	EventRecord::build("device", "", TrackOptions::event(name), &defaults).unwrap()
}

pub(crate) fn names(records: &[EventRecord]) -> Vec<String> {
	records.iter().map(|r| r.event.clone()).collect()
}
