//! Unix-second time sources used to stamp signed envelopes.

// std
use std::sync::atomic::{AtomicI64, Ordering};
// self
use crate::_prelude::*;

/// Source of the current Unix time in whole seconds.
///
/// The relay reads the clock exactly once per request, so implementations only need to be
/// monotonic enough for HMAC timestamps.
pub trait Clock
where
	Self: 'static + Send + Sync + Debug,
{
	/// Returns the current Unix time, floored to whole seconds.
	fn unix_seconds(&self) -> i64;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn unix_seconds(&self) -> i64 {
		OffsetDateTime::now_utc().unix_timestamp()
	}
}

/// Settable clock for deterministic signatures in tests and replays.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);
impl FixedClock {
	/// Creates a clock frozen at `unix_seconds`.
	pub fn new(unix_seconds: i64) -> Self {
		Self(AtomicI64::new(unix_seconds))
	}

	/// Moves the clock to `unix_seconds`.
	pub fn set(&self, unix_seconds: i64) {
		self.0.store(unix_seconds, Ordering::SeqCst);
	}
}
impl Clock for FixedClock {
	fn unix_seconds(&self) -> i64 {
		self.0.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn system_clock_tracks_wall_time() {
		let expected = OffsetDateTime::now_utc().unix_timestamp();
		let observed = SystemClock.unix_seconds();

		assert!((observed - expected).abs() <= 1);
	}

	#[test]
	fn fixed_clock_only_moves_when_set() {
		let clock = FixedClock::new(1_700_000_000);

		assert_eq!(clock.unix_seconds(), 1_700_000_000);

		clock.set(1_700_000_060);

		assert_eq!(clock.unix_seconds(), 1_700_000_060);
	}
}
