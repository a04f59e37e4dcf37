//! Optional observability helpers for relay requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `onoffice_relay.relay` with a `stage` field
//!   and to install a `tracing-subscriber` formatter from the binary.
//! - Enable `metrics` to increment the `onoffice_relay_requests_total` counter for every
//!   attempt/success/rejection/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Steps of the receive → validate → sign → forward → respond pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelayStage {
	/// Inbound method and body checks.
	Validate,
	/// Timestamp + HMAC computation.
	Sign,
	/// Upstream POST and response parsing.
	Forward,
}
impl RelayStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RelayStage::Validate => "validate",
			RelayStage::Sign => "sign",
			RelayStage::Forward => "forward",
		}
	}
}
impl Display for RelayStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelayOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Caller error (bad method, missing fields, malformed body).
	Rejected,
	/// Signing, transport, or upstream failure.
	Failure,
}
impl RelayOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RelayOutcome::Attempt => "attempt",
			RelayOutcome::Success => "success",
			RelayOutcome::Rejected => "rejected",
			RelayOutcome::Failure => "failure",
		}
	}
}
impl Display for RelayOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
