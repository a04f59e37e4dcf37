// self
use crate::obs::{RelayOutcome, RelayStage};

/// Counter incremented once per stage outcome.
pub const RELAY_REQUESTS_TOTAL: &str = "onoffice_relay_requests_total";

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_relay_outcome(stage: RelayStage, outcome: RelayOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			RELAY_REQUESTS_TOTAL,
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

#[cfg(all(test, feature = "metrics"))]
pub(crate) use tally::TallyRecorder;
