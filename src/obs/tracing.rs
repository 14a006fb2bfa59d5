// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by connector flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_connector.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Emits a debug event for a completed resource attempt.
pub fn trace_attempt(attempt: u8, uri: &str, status: u16) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(attempt, uri, status, "resource call completed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, uri, status);
	}
}

/// Emits a debug event for a connector step that involves no HTTP call (reload, save).
pub fn trace_step(step: &'static str, endpoint: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(step, endpoint, "connector step");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (step, endpoint);
	}
}

/// Emits a debug event when the token endpoint rejects a refresh.
pub fn trace_refresh_rejected(status: u16) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(status, "token refresh rejected by provider");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = status;
	}
}

/// Emits a warning when an error payload could not be written to the caller.
pub fn trace_relay_failure(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(%error, "failed to write error payload to the caller");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
