//! Optional observability hooks for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every operation inside a span named `moip_client.operation` with
//!   the `operation` and `stage` fields, and to emit events for retries, credential
//!   exchanges, and invalidations.
//! - Enable `metrics` to increment the `moip_client_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`, and the
//!   `moip_client_retry_total` counter for every scheduled retry, labeled by `operation` +
//!   `cause`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations issued by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Client-credentials exchange.
	TokenExchange,
	/// Order creation.
	OrderCreate,
	/// Order read.
	OrderGet,
	/// Payment creation.
	PaymentCreate,
	/// Payment read.
	PaymentGet,
	/// Pre-authorized payment capture.
	PaymentCapture,
	/// Pre-authorized payment cancellation.
	PaymentCancel,
	/// Sandbox authorization simulation.
	PaymentAuthorize,
	/// Escrow release.
	EscrowRelease,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::TokenExchange => "token_exchange",
			OperationKind::OrderCreate => "order_create",
			OperationKind::OrderGet => "order_get",
			OperationKind::PaymentCreate => "payment_create",
			OperationKind::PaymentGet => "payment_get",
			OperationKind::PaymentCapture => "payment_capture",
			OperationKind::PaymentCancel => "payment_cancel",
			OperationKind::PaymentAuthorize => "payment_authorize",
			OperationKind::EscrowRelease => "escrow_release",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the terminal outcome of `result` for `kind`.
pub(crate) fn record_result<T, E>(kind: OperationKind, result: &std::result::Result<T, E>) {
	match result {
		Ok(_) => record_operation_outcome(kind, OperationOutcome::Success),
		Err(_) => record_operation_outcome(kind, OperationOutcome::Failure),
	}
}
