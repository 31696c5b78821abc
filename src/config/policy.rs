//! Retry and read-after-write tunables.

// crates.io
use rand::Rng;
// self
use crate::{_prelude::*, error::ConfigError};

/// Bounded exponential backoff with jitter.
///
/// Attempt `n` (zero-based) waits `min(base_delay * 2^n, max_delay)` plus a random jitter of
/// up to `jitter_ratio` of that delay. A server-provided Retry-After hint raises the delay but
/// never above `max_delay`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Number of retries after the first attempt; zero disables retries.
	pub max_retries: u32,
	/// Delay before the first retry.
	pub base_delay: StdDuration,
	/// Upper bound for any single delay.
	pub max_delay: StdDuration,
	/// Jitter as a percentage of the computed delay (0-100).
	pub jitter_percent: u8,
}
impl RetryPolicy {
	const MAX_RETRIES_LIMIT: u32 = 10;

	/// A policy that never retries.
	pub const fn disabled() -> Self {
		Self {
			max_retries: 0,
			base_delay: StdDuration::ZERO,
			max_delay: StdDuration::ZERO,
			jitter_percent: 0,
		}
	}

	/// Overrides the retry count.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the base and maximum delays.
	pub fn with_delays(mut self, base_delay: StdDuration, max_delay: StdDuration) -> Self {
		self.base_delay = base_delay;
		self.max_delay = max_delay;

		self
	}

	/// Overrides the jitter percentage.
	pub fn with_jitter_percent(mut self, jitter_percent: u8) -> Self {
		self.jitter_percent = jitter_percent;

		self
	}

	/// Returns `true` while `attempt` (zero-based retry index) is within budget.
	pub fn allows(&self, attempt: u32) -> bool {
		attempt < self.max_retries
	}

	/// Computes the delay before retry `attempt`, honoring an optional Retry-After hint.
	pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> StdDuration {
		let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
		let exponential = self.base_delay.saturating_mul(factor).min(self.max_delay);
		let jittered = exponential.saturating_add(self.jitter(exponential)).min(self.max_delay);
		let hinted = retry_after
			.filter(|hint| hint.is_positive())
			.map(|hint| hint.unsigned_abs().min(self.max_delay))
			.unwrap_or(StdDuration::ZERO);

		jittered.max(hinted)
	}

	/// Checks the policy bounds.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_retries > Self::MAX_RETRIES_LIMIT {
			return Err(ConfigError::InvalidPolicy {
				reason: format!(
					"max_retries must not exceed {}, got {}",
					Self::MAX_RETRIES_LIMIT,
					self.max_retries
				),
			});
		}
		if self.base_delay > self.max_delay {
			return Err(ConfigError::InvalidPolicy {
				reason: format!(
					"base_delay ({:?}) cannot exceed max_delay ({:?})",
					self.base_delay, self.max_delay
				),
			});
		}
		if self.jitter_percent > 100 {
			return Err(ConfigError::InvalidPolicy {
				reason: format!("jitter_percent must be within 0..=100, got {}", self.jitter_percent),
			});
		}

		Ok(())
	}

	fn jitter(&self, delay: StdDuration) -> StdDuration {
		let ceiling = delay.as_millis().saturating_mul(u128::from(self.jitter_percent)) / 100;
		let ceiling = u64::try_from(ceiling).unwrap_or(u64::MAX);

		if ceiling == 0 {
			return StdDuration::ZERO;
		}

		StdDuration::from_millis(rand::rng().random_range(0..=ceiling))
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 3,
			base_delay: StdDuration::from_millis(200),
			max_delay: StdDuration::from_secs(5),
			jitter_percent: 20,
		}
	}
}

/// Settling and polling used when reading state shortly after writing it.
///
/// The service applies writes asynchronously; how long that takes is not part of its
/// contract, so every value here is a tunable. The defaults add no delay and no retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadAfterWritePolicy {
	/// Pause applied after a successful creation call before returning it.
	pub settle_delay: StdDuration,
	/// Extra attempts granted to a read that answers 404.
	pub not_found_retries: u32,
	/// Pause between polls and between not-found retries.
	pub poll_interval: StdDuration,
	/// Maximum reads performed by a status poll.
	pub max_polls: u32,
}
impl ReadAfterWritePolicy {
	/// Overrides the settle delay.
	pub fn with_settle_delay(mut self, delay: StdDuration) -> Self {
		self.settle_delay = delay;

		self
	}

	/// Overrides the not-found retry count.
	pub fn with_not_found_retries(mut self, retries: u32) -> Self {
		self.not_found_retries = retries;

		self
	}

	/// Overrides the polling cadence and budget.
	pub fn with_polling(mut self, interval: StdDuration, max_polls: u32) -> Self {
		self.poll_interval = interval;
		self.max_polls = max_polls;

		self
	}

	/// Checks the policy bounds.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_polls == 0 {
			return Err(ConfigError::InvalidPolicy { reason: "max_polls must be positive".into() });
		}

		Ok(())
	}
}
impl Default for ReadAfterWritePolicy {
	fn default() -> Self {
		Self {
			settle_delay: StdDuration::ZERO,
			not_found_retries: 0,
			poll_interval: StdDuration::from_millis(500),
			max_polls: 10,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn delays_grow_exponentially_and_cap() {
		let policy = RetryPolicy::default()
			.with_delays(StdDuration::from_millis(100), StdDuration::from_millis(350))
			.with_jitter_percent(0);

		assert_eq!(policy.delay_for(0, None), StdDuration::from_millis(100));
		assert_eq!(policy.delay_for(1, None), StdDuration::from_millis(200));
		assert_eq!(policy.delay_for(2, None), StdDuration::from_millis(350));
		assert_eq!(policy.delay_for(31, None), StdDuration::from_millis(350));
	}

	#[test]
	fn jitter_stays_within_ratio() {
		let policy = RetryPolicy::default()
			.with_delays(StdDuration::from_millis(100), StdDuration::from_secs(1))
			.with_jitter_percent(50);

		for _ in 0..32 {
			let delay = policy.delay_for(0, None);

			assert!(delay >= StdDuration::from_millis(100));
			assert!(delay <= StdDuration::from_millis(150));
		}
	}

	#[test]
	fn retry_after_raises_delay_up_to_cap() {
		let policy = RetryPolicy::default()
			.with_delays(StdDuration::from_millis(10), StdDuration::from_secs(2))
			.with_jitter_percent(0);

		assert_eq!(policy.delay_for(0, Some(Duration::seconds(1))), StdDuration::from_secs(1));
		assert_eq!(policy.delay_for(0, Some(Duration::seconds(30))), StdDuration::from_secs(2));
		assert_eq!(policy.delay_for(0, Some(Duration::seconds(-3))), StdDuration::from_millis(10));
	}

	#[test]
	fn budget_and_validation() {
		let policy = RetryPolicy::default().with_max_retries(2);

		assert!(policy.allows(0));
		assert!(policy.allows(1));
		assert!(!policy.allows(2));
		assert!(!RetryPolicy::disabled().allows(0));
		assert!(RetryPolicy::default().with_max_retries(11).validate().is_err());
		assert!(
			RetryPolicy::default()
				.with_delays(StdDuration::from_secs(2), StdDuration::from_secs(1))
				.validate()
				.is_err()
		);
		assert!(ReadAfterWritePolicy::default().with_polling(StdDuration::ZERO, 0).validate().is_err());
	}
}
