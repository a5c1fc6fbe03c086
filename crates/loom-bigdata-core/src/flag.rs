// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};

/// An atomic boolean used as a one-way closed/shutdown marker.
///
/// All operations use `SeqCst` so that a store of `true` by the closing side
/// and an in-flight counter update by a writer are observed in a single total
/// order.
#[derive(Debug, Default)]
pub struct AtomicFlag {
	inner: AtomicBool,
}

impl AtomicFlag {
	pub const fn new(initial: bool) -> Self {
		Self {
			inner: AtomicBool::new(initial),
		}
	}

	pub fn load(&self) -> bool {
		self.inner.load(Ordering::SeqCst)
	}

	pub fn store(&self, value: bool) {
		self.inner.store(value, Ordering::SeqCst);
	}

	/// Sets the flag to `new` if it currently equals `current`. Returns whether
	/// the swap happened.
	pub fn compare_and_swap(&self, current: bool, new: bool) -> bool {
		self
			.inner
			.compare_exchange(current, new, Ordering::SeqCst, Ordering::SeqCst)
			.is_ok()
	}

	/// Stores `value` and returns the previous value.
	pub fn swap(&self, value: bool) -> bool {
		self.inner.swap(value, Ordering::SeqCst)
	}

	/// Negates the flag and returns the previous value.
	pub fn toggle(&self) -> bool {
		self.inner.fetch_xor(true, Ordering::SeqCst)
	}
}
