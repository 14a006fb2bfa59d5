//! Optional observability helpers for connector calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `oauth2_connector.flow` with the `flow` (`call` or
//!   `refresh`) and `stage` fields, plus debug events for every resource attempt.
//! - Enable `metrics` to increment `oauth2_connector_flow_total` for every
//!   attempt/success/failure (labeled by `flow` + `outcome`) and
//!   `oauth2_connector_attempt_total` for every resource call (labeled by `attempt`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Top-level authenticated call.
	Call,
	/// Refresh-token grant exchange.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Call => "call",
			FlowKind::Refresh => "refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a connector flow.
	Attempt,
	/// A response was relayed to the caller.
	Success,
	/// A structured error was surfaced to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
