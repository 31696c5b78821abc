//! Resource facades and the domain types they return.
//!
//! Each facade wraps the endpoints of one resource type and depends only on the
//! [`Execute`] seam, so it can run against [`RequestExecutor`](crate::executor::RequestExecutor)
//! or any test double.

pub mod escrow;
pub mod id;
pub mod model;
pub mod order;
pub mod payment;
pub mod status;

pub use escrow::*;
pub use id::*;
pub use model::*;
pub use order::*;
pub use payment::*;
pub use status::*;

// self
use crate::{
	_prelude::*,
	config::ReadAfterWritePolicy,
	error::ConfigError,
	executor::{ApiRequest, ApiResponse, Execute},
};

/// Serializes a request body, keeping unknown extra fields verbatim.
fn to_body<T>(spec: &T) -> Result<JsonValue>
where
	T: Serialize,
{
	serde_json::to_value(spec).map_err(|err| ConfigError::RequestBody(err).into())
}

/// Pauses after a successful write so a follow-up read observes it.
async fn settle(policy: &ReadAfterWritePolicy) {
	if !policy.settle_delay.is_zero() {
		tokio::time::sleep(policy.settle_delay).await;
	}
}

/// Runs a read, re-issuing it while it answers 404 and the not-found budget lasts.
async fn read_with_retries<E, F>(
	executor: &E,
	policy: &ReadAfterWritePolicy,
	request: F,
) -> Result<ApiResponse>
where
	E: ?Sized + Execute,
	F: Fn() -> ApiRequest,
{
	let mut retries = 0;

	loop {
		match executor.execute(request()).await {
			Err(err) if err.is_not_found() && retries < policy.not_found_retries => {
				retries += 1;

				tokio::time::sleep(policy.poll_interval).await;
			},
			outcome => return outcome,
		}
	}
}
