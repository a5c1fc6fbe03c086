// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller-facing producer: validates, enriches and forwards records.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use loom_bigdata_core::{AtomicFlag, EventRecord, Properties, RecordKind, TrackOptions};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::attrs::PublicAttrs;
use crate::codec::EncodedBatch;
use crate::config::{BigDataConfig, TransportConfig};
use crate::error::{BigDataError, Result};
use crate::transport::{HttpTransport, Transport};
use crate::writer::{BatchWriter, LogWriter};

/// Platform ID stamped on synchronously sent records that carry none.
pub const DEFAULT_SYNC_PLATFORM_ID: i32 = 10;

/// Builder for constructing a [`Producer`].
pub struct ProducerBuilder {
	config: BigDataConfig,
	transport: Option<Arc<dyn Transport>>,
	transport_config: Option<TransportConfig>,
	writer: Option<Arc<dyn LogWriter>>,
	public_attrs: PublicAttrs,
}

impl ProducerBuilder {
	pub fn new(config: BigDataConfig) -> Self {
		Self {
			config,
			transport: None,
			transport_config: None,
			writer: None,
			public_attrs: PublicAttrs::default(),
		}
	}

	/// Uses the given transport for all deliveries.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Delivers over HTTP; ignored when [`transport`](Self::transport) is set.
	pub fn http(mut self, config: TransportConfig) -> Self {
		self.transport_config = Some(config);
		self
	}

	/// Replaces the default [`BatchWriter`].
	pub fn writer(mut self, writer: Arc<dyn LogWriter>) -> Self {
		self.writer = Some(writer);
		self
	}

	pub fn public_attrs(mut self, attrs: PublicAttrs) -> Self {
		self.public_attrs = attrs;
		self
	}

	/// Builds the producer and starts its writer.
	pub async fn build(self) -> Result<Producer> {
		let config = Arc::new(self.config.validated());
		let transport: Arc<dyn Transport> = match (self.transport, self.transport_config) {
			(Some(transport), _) => transport,
			(None, Some(http)) => Arc::new(HttpTransport::new(http)?),
			(None, None) => return Err(BigDataError::MissingTransport),
		};
		let writer: Arc<dyn LogWriter> = match self.writer {
			Some(writer) => writer,
			None => Arc::new(BatchWriter::new(config.clone(), transport.clone())),
		};
		writer.init().await?;

		info!(
			batch_size = config.batch_size,
			cache_capacity = config.cache_capacity,
			auto_flush = config.auto_flush,
			"Big-data producer started"
		);

		Ok(Producer {
			config,
			transport,
			writer,
			public_attrs: self.public_attrs,
			shutdown: AtomicFlag::new(false),
			in_flight: InFlight::default(),
		})
	}
}

/// Entry point for reporting events and user-property updates.
///
/// `close` must be awaited before the process exits; records still buffered
/// when the process ends are lost.
///
/// # Example
///
/// ```ignore
/// use loom_bigdata::{BigDataConfig, Producer, TransportConfig};
/// use loom_bigdata_core::Properties;
///
/// let producer = Producer::builder(BigDataConfig {
///     cp_partner_id: 1000049,
///     auto_flush: true,
///     ..BigDataConfig::default()
/// })
/// .http(TransportConfig::new("https://loom.example.com"))
/// .build()
/// .await?;
///
/// producer
///     .track("device-123", "user-1", "game_start", Properties::new().insert("map", "desert"))
///     .await?;
///
/// producer.close().await?;
/// ```
pub struct Producer {
	config: Arc<BigDataConfig>,
	transport: Arc<dyn Transport>,
	writer: Arc<dyn LogWriter>,
	public_attrs: PublicAttrs,
	shutdown: AtomicFlag,
	in_flight: InFlight,
}

impl Producer {
	pub fn builder(config: BigDataConfig) -> ProducerBuilder {
		ProducerBuilder::new(config)
	}

	/// Reports an event. Preset keys (`$cpid`, `$appid`, ...) in `properties`
	/// are lifted into the record's typed fields.
	pub async fn track(
		&self,
		device_code: &str,
		distinct_id: &str,
		event: &str,
		properties: Properties,
	) -> Result<()> {
		let options = TrackOptions::from_properties(RecordKind::Event, event, properties);
		self.tracks(device_code, distinct_id, options).await
	}

	/// Reports a user-property update such as `user_set` or `user_setonce`.
	pub async fn user_track(
		&self,
		device_code: &str,
		distinct_id: &str,
		update: &str,
		properties: Properties,
	) -> Result<()> {
		let options = TrackOptions::from_properties(RecordKind::UserUpdate, update, properties);
		self.tracks(device_code, distinct_id, options).await
	}

	/// Reports a record described by `options`.
	pub async fn tracks(
		&self,
		device_code: &str,
		distinct_id: &str,
		options: TrackOptions,
	) -> Result<()> {
		self
			.guarded(async {
				let record = self.build_record(device_code, distinct_id, options)?;
				self.writer.write(record).await
			})
			.await
	}

	/// Validates one record and sends it immediately as a single-record batch,
	/// bypassing the buffers.
	pub async fn sync_track(
		&self,
		device_code: &str,
		distinct_id: &str,
		options: TrackOptions,
	) -> Result<()> {
		self
			.guarded(async {
				let mut record = self.build_record(device_code, distinct_id, options)?;
				if record.platform_id <= 0 {
					record.platform_id = DEFAULT_SYNC_PLATFORM_ID;
				}
				let batch = EncodedBatch::encode(std::slice::from_ref(&record), self.config.compress())?;
				let status = self.transport.send(&batch).await?;
				debug!(status, uuid = %record.uuid, "Record sent synchronously");
				Ok(())
			})
			.await
	}

	/// Attempts delivery of the oldest cached batch now.
	pub async fn flush(&self) -> Result<()> {
		if self.shutdown.load() {
			return Err(BigDataError::ProducerShutdown);
		}
		self.writer.flush().await
	}

	/// Refuses new records, waits for in-flight calls to finish, then closes
	/// the writer with one final flush.
	///
	/// An error means records that were still cached are lost.
	pub async fn close(&self) -> Result<()> {
		if self.shutdown.swap(true) {
			return Err(BigDataError::ProducerShutdown);
		}
		let pending = self.in_flight.count();
		if pending > 0 {
			debug!(pending, "Waiting for in-flight track calls");
		}
		self.in_flight.wait_idle().await;
		self.writer.close().await
	}

	pub fn is_shutdown(&self) -> bool {
		self.shutdown.load()
	}

	/// Number of track calls currently executing.
	pub fn in_flight(&self) -> usize {
		self.in_flight.count()
	}

	pub fn config(&self) -> &BigDataConfig {
		&self.config
	}

	/// Runs `op` registered as in-flight, unless shutdown has begun.
	async fn guarded<F>(&self, op: F) -> Result<()>
	where
		F: Future<Output = Result<()>>,
	{
		if self.shutdown.load() {
			return Err(BigDataError::ProducerShutdown);
		}
		let _guard = self.in_flight.enter();
		// Re-check once registered: close sets the flag before reading the count.
		if self.shutdown.load() {
			return Err(BigDataError::ProducerShutdown);
		}
		op.await
	}

	fn build_record(
		&self,
		device_code: &str,
		distinct_id: &str,
		options: TrackOptions,
	) -> Result<EventRecord> {
		let mut record =
			EventRecord::build(device_code, distinct_id, options, &self.config.record_defaults())?;
		if record.kind == RecordKind::Event {
			self.public_attrs.apply(&mut record.properties);
		}
		Ok(record)
	}
}

/// Counts executing track calls and wakes waiters when the count hits zero.
#[derive(Debug, Default)]
struct InFlight {
	count: AtomicUsize,
	idle: Notify,
}

struct InFlightGuard<'a> {
	tracker: &'a InFlight,
}

impl InFlight {
	fn enter(&self) -> InFlightGuard<'_> {
		self.count.fetch_add(1, Ordering::SeqCst);
		InFlightGuard { tracker: self }
	}

	fn count(&self) -> usize {
		self.count.load(Ordering::SeqCst)
	}

	async fn wait_idle(&self) {
		loop {
			let notified = self.idle.notified();
			tokio::pin!(notified);
			notified.as_mut().enable();
			if self.count() == 0 {
				return;
			}
			notified.await;
		}
	}
}

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		if self.tracker.count.fetch_sub(1, Ordering::SeqCst) == 1 {
			self.tracker.idle.notify_waiters();
		}
	}
}
