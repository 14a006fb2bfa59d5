// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_connector_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts one resource call; `attempt` is 1 for the first call, 2 after a reload, 3 after a
/// refresh.
pub fn record_resource_attempt(attempt: u8) {
	#[cfg(feature = "metrics")]
	{
		let label = match attempt {
			1 => "first",
			2 => "reload",
			_ => "refresh",
		};

		metrics::counter!("oauth2_connector_attempt_total", "attempt" => label).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = attempt;
	}
}
