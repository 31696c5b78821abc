// self
use crate::obs::{OperationKind, OperationOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"moip_client_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a scheduled retry, labelled by what made the attempt fail.
pub fn record_retry(kind: OperationKind, status: Option<u16>) {
	let cause = retry_cause(status);

	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"moip_client_retry_total",
			"operation" => kind.as_str(),
			"cause" => cause
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, cause);
	}
}

fn retry_cause(status: Option<u16>) -> &'static str {
	match status {
		None => "transport",
		Some(429) => "throttled",
		Some(500..=599) => "server",
		Some(_) => "other",
	}
}
