// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for transient failures.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Classifies errors into transient (worth another attempt) and permanent.
pub trait RetryableError {
	/// Returns true if the operation that produced this error may succeed when
	/// attempted again.
	fn is_retryable(&self) -> bool;
}

/// Backoff schedule for [`retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total number of attempts, including the first one.
	pub max_attempts: u32,
	/// Delay before the second attempt. Zero disables sleeping entirely.
	pub base_delay: Duration,
	/// Upper bound for any single delay.
	pub max_delay: Duration,
	/// Multiplier applied to the delay after each failed attempt.
	pub backoff_factor: f64,
	/// Randomise each delay into `[delay / 2, delay]`.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A schedule that retries immediately, `max_attempts` times in total.
	pub fn immediate(max_attempts: u32) -> Self {
		Self {
			max_attempts,
			base_delay: Duration::ZERO,
			max_delay: Duration::ZERO,
			backoff_factor: 1.0,
			jitter: false,
		}
	}

	/// Delay to wait after the given (1-based) failed attempt.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		if self.base_delay.is_zero() {
			return Duration::ZERO;
		}
		let exp = attempt.saturating_sub(1) as i32;
		let millis = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exp);
		let capped = Duration::from_millis(millis as u64).min(self.max_delay);
		if self.jitter {
			capped.mul_f64(0.5 + fastrand::f64() * 0.5)
		} else {
			capped
		}
	}
}

/// Runs `op` until it succeeds, returns a non-retryable error, or the attempt
/// budget is spent. The last error is returned on exhaustion.
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, mut op: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + Display,
{
	let max_attempts = config.max_attempts.max(1);
	let mut attempt = 1;
	loop {
		match op().await {
			Ok(value) => {
				if attempt > 1 {
					debug!(attempt, "Request succeeded after retry");
				}
				return Ok(value);
			}
			Err(e) if !e.is_retryable() => {
				debug!(attempt, error = %e, "Non-retryable error, giving up");
				return Err(e);
			}
			Err(e) if attempt >= max_attempts => {
				warn!(attempt, error = %e, "Retry budget exhausted");
				return Err(e);
			}
			Err(e) => {
				let delay = config.delay_for(attempt);
				warn!(
					attempt,
					max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = %e,
					"Retryable error, retrying"
				);
				if !delay.is_zero() {
					tokio::time::sleep(delay).await;
				}
				attempt += 1;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[derive(Debug)]
	struct TestError {
		retryable: bool,
	}

	impl Display for TestError {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			write!(f, "test error (retryable: {})", self.retryable)
		}
	}

	impl RetryableError for TestError {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	#[tokio::test]
	async fn succeeds_on_first_attempt() {
		let calls = AtomicU32::new(0);
		let result: Result<u32, TestError> = retry(&RetryConfig::immediate(3), || async {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok(7)
		})
		.await;

		assert_eq!(result.unwrap(), 7);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn retries_until_success() {
		let calls = AtomicU32::new(0);
		let result: Result<u32, TestError> = retry(&RetryConfig::immediate(3), || async {
			let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
			if n < 3 {
				Err(TestError { retryable: true })
			} else {
				Ok(n)
			}
		})
		.await;

		assert_eq!(result.unwrap(), 3);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn stops_after_max_attempts() {
		let calls = AtomicU32::new(0);
		let result: Result<(), TestError> = retry(&RetryConfig::immediate(3), || async {
			calls.fetch_add(1, Ordering::SeqCst);
			Err(TestError { retryable: true })
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn non_retryable_error_aborts_immediately() {
		let calls = AtomicU32::new(0);
		let result: Result<(), TestError> = retry(&RetryConfig::immediate(3), || async {
			calls.fetch_add(1, Ordering::SeqCst);
			Err(TestError { retryable: false })
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn backoff_sleeps_between_attempts() {
		let config = RetryConfig {
			max_attempts: 2,
			base_delay: Duration::from_millis(100),
			max_delay: Duration::from_secs(1),
			backoff_factor: 2.0,
			jitter: false,
		};
		let start = tokio::time::Instant::now();
		let _: Result<(), TestError> =
			retry(&config, || async { Err(TestError { retryable: true }) }).await;

		assert!(start.elapsed() >= Duration::from_millis(100));
	}

	#[test]
	fn delay_is_capped() {
		let config = RetryConfig {
			max_attempts: 10,
			base_delay: Duration::from_millis(500),
			max_delay: Duration::from_secs(2),
			backoff_factor: 2.0,
			jitter: false,
		};

		assert_eq!(config.delay_for(1), Duration::from_millis(500));
		assert_eq!(config.delay_for(2), Duration::from_secs(1));
		assert_eq!(config.delay_for(5), Duration::from_secs(2));
	}

	#[test]
	fn immediate_config_never_sleeps() {
		let config = RetryConfig::immediate(3);
		assert_eq!(config.delay_for(1), Duration::ZERO);
		assert_eq!(config.delay_for(3), Duration::ZERO);
	}

	#[test]
	fn jittered_delay_stays_in_range() {
		let config = RetryConfig {
			jitter: true,
			..RetryConfig::default()
		};
		for attempt in 1..5 {
			let full = RetryConfig {
				jitter: false,
				..config.clone()
			}
			.delay_for(attempt);
			let jittered = config.delay_for(attempt);
			assert!(jittered <= full);
			assert!(jittered >= full / 2);
		}
	}
}
