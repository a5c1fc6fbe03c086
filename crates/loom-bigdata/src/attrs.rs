// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public attributes: properties computed at capture time and attached to
//! every event.

use std::fmt;
use std::sync::Arc;

use loom_bigdata_core::Properties;
use serde_json::Value;

type AttrHandler = Arc<dyn Fn() -> Value + Send + Sync>;

/// Named handlers evaluated for each tracked event.
///
/// A handler never overrides a property the caller set explicitly.
///
/// ```
/// use loom_bigdata::PublicAttrs;
///
/// let attrs = PublicAttrs::new()
///     .with("server_region", || "eu-west")
///     .with("build", || 4821);
/// assert_eq!(attrs.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct PublicAttrs {
	handlers: Vec<(String, AttrHandler)>,
}

impl PublicAttrs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a handler. A later registration under the same name
	/// replaces the earlier one.
	pub fn with<F, V>(mut self, name: impl Into<String>, handler: F) -> Self
	where
		F: Fn() -> V + Send + Sync + 'static,
		V: Into<Value>,
	{
		let name = name.into();
		let handler: AttrHandler = Arc::new(move || handler().into());
		match self.handlers.iter_mut().find(|(n, _)| *n == name) {
			Some(slot) => slot.1 = handler,
			None => self.handlers.push((name, handler)),
		}
		self
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}

	/// Fills in every registered attribute missing from `properties`.
	pub fn apply(&self, properties: &mut Properties) {
		for (name, handler) in &self.handlers {
			if !properties.contains_key(name) {
				properties.set(name.clone(), handler());
			}
		}
	}
}

impl fmt::Debug for PublicAttrs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.handlers.iter().map(|(name, _)| name))
			.finish()
	}
}
