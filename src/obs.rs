//! Optional observability helpers for login flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `uber_auth.flow` with the `flow` (stage of
//!   the login), `stage` (call site), and `attempt` (slot generation) fields.
//! - Enable `metrics` to increment the `uber_auth_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.
//!
//! A single login usually records several flows. A native login with prefill data records
//! `pushed_authorization`, then `login` once the app is launched, and finally `callback`
//! and `token_exchange` when the host hands the redirect back. `login` failures include
//! attempts rejected because another one was still in flight.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Login flow stages observed by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Whole login attempt, from `execute` to the completion.
	///
	/// Its terminal outcome is recorded once, right before the completion fires, whether
	/// the attempt ended through a callback, a dismissed browser session, or a setup error.
	Login,
	/// Redirect callback consumed by the attempt, either from the host or from the browser
	/// session; callbacks that match no waiting attempt record nothing.
	Callback,
	/// Pushed authorization request carrying prefill data, sent before the authorize URL
	/// is built.
	PushedAuthorization,
	/// PKCE-bound authorization-code exchange at the token endpoint; skipped when the code
	/// is handed to the caller unexchanged.
	TokenExchange,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Login => "login",
			FlowKind::Callback => "callback",
			FlowKind::PushedAuthorization => "pushed_authorization",
			FlowKind::TokenExchange => "token_exchange",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure delivered to the caller.
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

	/// Maps a result onto its terminal outcome.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
