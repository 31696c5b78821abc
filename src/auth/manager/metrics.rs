// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential exchanges and cache use.
#[derive(Debug, Default)]
pub struct CredentialMetrics {
	exchanges: AtomicU64,
	reuses: AtomicU64,
	invalidations: AtomicU64,
	failures: AtomicU64,
}
impl CredentialMetrics {
	/// Returns the number of token endpoint calls, retries included.
	pub fn exchanges(&self) -> u64 {
		self.exchanges.load(Ordering::Relaxed)
	}

	/// Returns the number of calls served from the cache or from a coalesced exchange.
	pub fn reuses(&self) -> u64 {
		self.reuses.load(Ordering::Relaxed)
	}

	/// Returns the number of rejected credentials dropped from the cache.
	pub fn invalidations(&self) -> u64 {
		self.invalidations.load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions that surfaced an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_exchange(&self) {
		self.exchanges.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reuse(&self) {
		self.reuses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_invalidation(&self) {
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
