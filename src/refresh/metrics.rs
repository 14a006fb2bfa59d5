// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh-token exchanges performed by a connector.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	issued: AtomicU64,
	unchanged: AtomicU64,
	failures: AtomicU64,
}
impl RefreshMetrics {
	/// Total number of exchanges started.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Exchanges that produced a new, different access token.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Exchanges the provider rejected or that returned the token already cached.
	pub fn unchanged(&self) -> u64 {
		self.unchanged.load(Ordering::Relaxed)
	}

	/// Exchanges that failed in transport or while parsing the provider payload.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_unchanged(&self) {
		self.unchanged.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
