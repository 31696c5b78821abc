//! Escrows: funds held on a payment until released.

// self
use crate::{
	_prelude::*,
	executor::{ApiRequest, Execute},
	obs::OperationKind,
	resource::{EscrowId, Links, Status},
};

/// Escrow as reported by the service.
///
/// Escrows are only obtainable from the `escrows` collection of a payment created with
/// escrow terms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Escrow {
	/// Server-assigned identifier.
	pub id: EscrowId,
	/// Lifecycle status (`HOLD_PENDING`, `HOLD`, `RELEASED`).
	pub status: Status,
	/// Held amount in cents.
	#[serde(default)]
	pub amount: Option<i64>,
	/// Reason given when the escrow was created.
	#[serde(default)]
	pub description: Option<String>,
	/// Hypermedia links.
	#[serde(rename = "_links", default)]
	pub links: Links,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Escrow endpoints.
pub struct EscrowFacade<E = dyn Execute>
where
	E: ?Sized,
{
	executor: Arc<E>,
}
impl<E> EscrowFacade<E>
where
	E: ?Sized + Execute,
{
	/// Creates a facade over `executor`.
	pub fn new(executor: Arc<E>) -> Self {
		Self { executor }
	}

	/// Releases held funds (`POST v2/escrows/{id}/release`).
	///
	/// Unknown or non-releasable escrows fail with [`ClientError`](crate::error::ClientError).
	pub async fn release(&self, id: &EscrowId) -> Result<Escrow> {
		let request =
			ApiRequest::post(OperationKind::EscrowRelease, ["v2", "escrows", id.as_str(), "release"]);

		Ok(self.executor.execute(request).await?.into_json()?)
	}
}
impl<E> Clone for EscrowFacade<E>
where
	E: ?Sized,
{
	fn clone(&self) -> Self {
		Self { executor: Arc::clone(&self.executor) }
	}
}
impl<E> Debug for EscrowFacade<E>
where
	E: ?Sized,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("EscrowFacade(..)")
	}
}
