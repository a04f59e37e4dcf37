// self
use crate::{_prelude::*, obs::RelayStage};
#[cfg(feature = "tracing")] use crate::error::ConfigError;

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRelay<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRelay<F> = F;

/// A span builder used around relay stages.
#[derive(Clone, Debug)]
pub struct RelaySpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RelaySpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: RelayStage) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("onoffice_relay.relay", stage = stage.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRelay<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a failed stage. Caller errors are logged at `debug`, everything else at `error`.
pub fn report_failure(stage: RelayStage, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		match err {
			Error::Request(_) => tracing::debug!(stage = stage.as_str(), error = %err, "Request rejected."),
			Error::Upstream(crate::error::UpstreamError::InvalidJson { status, parse_error }) =>
				tracing::error!(
					stage = stage.as_str(),
					status,
					parse_error = %parse_error,
					"onOffice returned a non-JSON body."
				),
			_ => tracing::error!(stage = stage.as_str(), error = %err, "Relay failed."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, err);
	}
}

/// Installs a global `fmt` subscriber. `RUST_LOG` takes precedence over `default_filter`.
#[cfg(feature = "tracing")]
pub fn init_subscriber(default_filter: &str) -> Result<(), ConfigError> {
	// crates.io
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(default_filter))
		.map_err(|e| ConfigError::Subscriber { source: Box::new(e) })?;

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.try_init()
		.map_err(|source| ConfigError::Subscriber { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = RelaySpan::new(RelayStage::Forward);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn report_failure_accepts_every_error_class() {
		let io = std::io::Error::other("boom");

		report_failure(RelayStage::Forward, &Error::Io(io));
		report_failure(RelayStage::Sign, &Error::signing("bad key"));
	}
}
