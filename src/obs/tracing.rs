// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span wrapping one stage of a login attempt.
///
/// Spans are named `uber_auth.flow` and carry `flow`, `stage`, and, once the provider has
/// claimed its slot, the `attempt` generation id. Callback spans opened by the host's
/// `handle` call leave `attempt` empty because the callback is not yet matched.
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
			let span = tracing::info_span!(
				"uber_auth.flow",
				flow = kind.as_str(),
				stage,
				attempt = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Tags the span with the attempt it belongs to.
	pub fn with_attempt(self, id: u64) -> Self {
		#[cfg(feature = "tracing")]
		{
			self.span.record("attempt", id);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = id;
		}

		self
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn attempt_spans_pass_output_through() {
		for kind in [
			FlowKind::Login,
			FlowKind::Callback,
			FlowKind::PushedAuthorization,
			FlowKind::TokenExchange,
		] {
			let span = FlowSpan::new(kind, "attempt_spans_pass_output_through").with_attempt(7);
			let value = span.instrument(async { kind.as_str() }).await;

			assert_eq!(value, kind.as_str());
		}
	}
}
