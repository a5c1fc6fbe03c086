// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batching writer with a bounded retry cache and background flush.
//!
//! Records are appended to a staging buffer. A flush moves staged records into
//! the retry cache, sends the oldest `batch_size` cached records, and removes
//! them only once the transport confirms delivery. Records that cannot be
//! delivered stay cached for the next flush, up to `cache_capacity`; beyond
//! that the oldest are dropped.
//!
//! Staging and cache have separate locks. Producers only ever take the
//! staging lock, so they are not serialized behind a flush that is waiting on
//! the network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use loom_bigdata_core::{AtomicFlag, EventRecord};
use loom_common_http::{retry, RetryConfig};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec::EncodedBatch;
use crate::config::BigDataConfig;
use crate::error::{BigDataError, Result};
use crate::transport::Transport;

/// Sink driven by the [`Producer`](crate::Producer).
///
/// `init` is called once after construction and `close` exactly once, last.
#[async_trait]
pub trait LogWriter: Send + Sync {
	/// Starts any background work.
	async fn init(&self) -> Result<()>;

	/// Accepts one validated record. May flush, in which case a delivery
	/// error is returned to this caller.
	async fn write(&self, record: EventRecord) -> Result<()>;

	/// Attempts delivery of the oldest cached batch.
	async fn flush(&self) -> Result<()>;

	/// Stops background work and performs a final flush.
	async fn close(&self) -> Result<()>;
}

/// The production [`LogWriter`].
pub struct BatchWriter {
	shared: Arc<Shared>,
	started: AtomicFlag,
	cancel: CancellationToken,
	task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
	config: Arc<BigDataConfig>,
	transport: Arc<dyn Transport>,
	retry_config: RetryConfig,
	staging: Mutex<Vec<EventRecord>>,
	cache: Mutex<VecDeque<EventRecord>>,
	/// Mirror of the cache length, readable without the cache lock.
	cache_len: AtomicUsize,
	closed: AtomicFlag,
}

impl BatchWriter {
	pub fn new(config: Arc<BigDataConfig>, transport: Arc<dyn Transport>) -> Self {
		let retry_config = config.retry_config();
		let shared = Arc::new(Shared {
			staging: Mutex::new(Vec::with_capacity(config.batch_size)),
			cache: Mutex::new(VecDeque::with_capacity(config.batch_size * 2)),
			cache_len: AtomicUsize::new(0),
			closed: AtomicFlag::new(false),
			config,
			transport,
			retry_config,
		});

		Self {
			shared,
			started: AtomicFlag::new(false),
			cancel: CancellationToken::new(),
			task: Mutex::new(None),
		}
	}

	/// Number of records waiting in the staging buffer.
	pub async fn staged_len(&self) -> usize {
		self.shared.staging.lock().await.len()
	}

	/// Number of records in the retry cache.
	pub fn cached_len(&self) -> usize {
		self.shared.cache_len.load(Ordering::SeqCst)
	}

	/// Copy of the retry cache, oldest first.
	pub async fn cached_records(&self) -> Vec<EventRecord> {
		self.shared.cache.lock().await.iter().cloned().collect()
	}

	pub fn is_closed(&self) -> bool {
		self.shared.closed.load()
	}
}

#[async_trait]
impl LogWriter for BatchWriter {
	async fn init(&self) -> Result<()> {
		if self.started.swap(true) {
			return Err(BigDataError::AlreadyStarted);
		}
		if !self.shared.config.auto_flush {
			return Ok(());
		}

		let interval = self.shared.config.auto_flush_interval();
		let handle = tokio::spawn(run_auto_flush(
			self.shared.clone(),
			self.cancel.clone(),
			interval,
		));
		*self.task.lock().await = Some(handle);
		Ok(())
	}

	async fn write(&self, record: EventRecord) -> Result<()> {
		let staged = {
			let mut staging = self.shared.staging.lock().await;
			// close sets the flag before its final flush takes this lock.
			if self.shared.closed.load() {
				return Err(BigDataError::WriterClosed);
			}
			staging.push(record);
			staging.len()
		};

		if staged >= self.shared.config.batch_size || self.shared.cache_len.load(Ordering::SeqCst) > 0
		{
			return self.shared.flush().await;
		}
		Ok(())
	}

	async fn flush(&self) -> Result<()> {
		self.shared.flush().await
	}

	async fn close(&self) -> Result<()> {
		if self.shared.closed.swap(true) {
			return Err(BigDataError::WriterClosed);
		}

		self.cancel.cancel();
		if let Some(handle) = self.task.lock().await.take() {
			if let Err(e) = handle.await {
				warn!(error = %e, "Auto-flush task ended abnormally");
			}
		}

		let result = self.shared.flush().await;
		let remaining = self.cached_len() + self.staged_len().await;
		match &result {
			Ok(()) if remaining == 0 => info!("Big-data writer closed"),
			Ok(()) => warn!(remaining, "Big-data writer closed with undelivered records"),
			Err(e) => error!(remaining, error = %e, "Final flush failed, undelivered records lost"),
		}
		result
	}
}

impl Drop for BatchWriter {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

impl Shared {
	async fn flush(&self) -> Result<()> {
		let mut staging = self.staging.lock().await;
		let mut cache = self.cache.lock().await;

		if cache.is_empty() && staging.is_empty() {
			return Ok(());
		}

		// A partial staging batch is not mixed into an unresolved retry batch.
		if cache.is_empty() || staging.len() >= self.config.batch_size {
			cache.extend(staging.drain(..));
			self.cache_len.store(cache.len(), Ordering::SeqCst);
		}
		drop(staging);

		let result = self.deliver_front(&mut cache).await;
		self.enforce_capacity(&mut cache);
		self.cache_len.store(cache.len(), Ordering::SeqCst);
		result
	}

	/// Sends the oldest `batch_size` cached records, removing them on success.
	async fn deliver_front(&self, cache: &mut VecDeque<EventRecord>) -> Result<()> {
		let n = cache.len().min(self.config.batch_size);
		let batch = EncodedBatch::encode(&cache.make_contiguous()[..n], self.config.compress())?;

		let transport = &self.transport;
		match retry(&self.retry_config, || transport.send(&batch)).await {
			Ok(status) => {
				cache.drain(..n);
				debug!(count = n, status, remaining = cache.len(), "Flushed big-data batch");
				Ok(())
			}
			Err(e) => {
				warn!(
					count = n,
					status = e.status(),
					error = %e,
					"Failed to deliver big-data batch, keeping it cached"
				);
				Err(e)
			}
		}
	}

	/// Keeps only the newest `cache_capacity` records.
	fn enforce_capacity(&self, cache: &mut VecDeque<EventRecord>) {
		let capacity = self.config.cache_capacity;
		if cache.len() > capacity {
			let dropped = cache.len() - capacity;
			cache.drain(..dropped);
			warn!(dropped, capacity, "Retry cache full, dropped oldest records");
		}
	}
}

async fn run_auto_flush(shared: Arc<Shared>, cancel: CancellationToken, period: Duration) {
	info!(
		flush_interval_secs = period.as_secs(),
		batch_size = shared.config.batch_size,
		"Starting big-data auto-flush"
	);

	let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	let mut failures = FailureStreak::default();

	loop {
		tokio::select! {
			_ = cancel.cancelled() => break,
			_ = ticker.tick() => match shared.flush().await {
				Ok(()) => failures.succeeded(),
				Err(e) => {
					failures.failed(&e);
				}
			},
		}
	}

	info!("Big-data auto-flush stopped");
}

/// Rate-limits logging of repeated periodic flush failures.
#[derive(Debug, Default)]
struct FailureStreak {
	consecutive: u32,
}

impl FailureStreak {
	const LOG_EVERY: u32 = 10;

	/// Returns whether the failure was logged.
	fn failed(&mut self, e: &BigDataError) -> bool {
		self.consecutive += 1;
		let log = self.consecutive == 1 || self.consecutive % Self::LOG_EVERY == 0;
		if log {
			error!(consecutive = self.consecutive, error = %e, "Periodic big-data flush failed");
		}
		log
	}

	fn succeeded(&mut self) {
		if self.consecutive > 0 {
			info!(after_failures = self.consecutive, "Periodic big-data flush recovered");
			self.consecutive = 0;
		}
	}
}
