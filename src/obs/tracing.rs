// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("moip_client.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
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

/// Emits an event before sleeping ahead of a retry.
pub(crate) fn retry_scheduled(
	kind: OperationKind,
	attempt: u32,
	delay: StdDuration,
	reason: &dyn Display,
) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		operation = kind.as_str(),
		attempt,
		delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
		%reason,
		"retrying after a retryable failure"
	);

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, attempt, delay, reason);
	}
}

/// Emits an event after a successful credential exchange.
pub(crate) fn credential_issued(expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%expires_at, "access token issued");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = expires_at;
	}
}

/// Emits an event when a rejected credential is dropped from the cache.
pub(crate) fn credential_invalidated(fingerprint: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(token = fingerprint, "cached access token rejected; re-acquiring");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = fingerprint;
	}
}

/// Emits an event when a failure is surfaced to the caller.
pub(crate) fn operation_failed(kind: OperationKind, status: Option<u16>, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::debug!(operation = kind.as_str(), status, %error, "operation failed");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, status, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn hooks_noop_without_tracing() {
		let _span = OperationSpan::new(OperationKind::PaymentGet, "test");

		retry_scheduled(OperationKind::PaymentGet, 0, StdDuration::from_millis(5), &"timeout");
		credential_issued(OffsetDateTime::now_utc());
		credential_invalidated("abcdefgh");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OperationSpan::new(OperationKind::OrderCreate, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
