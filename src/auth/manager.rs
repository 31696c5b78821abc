//! Credential cache with coalesced acquisition and one-shot invalidation.
//!
//! The manager keeps a single cached [`Credential`] behind a `RwLock` and serializes
//! exchanges through a singleflight `AsyncMutex`. Every completed exchange bumps a generation
//! counter, whether it produced a credential or an error: a caller that observed generation
//! `g` and then waited on the guard reuses that outcome if the generation moved past `g`
//! while it was waiting. N concurrent callers arriving before any token exists trigger
//! exactly one exchange, and a rejected exchange fails all of them with the same
//! [`AuthError`].
//!
//! [`CredentialManager::invalidate`] only drops the cache when it still holds the rejected
//! token, which keeps a burst of 401 responses for the same token from stampeding the
//! authorization endpoint.

mod metrics;

pub use metrics::CredentialMetrics;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::{AuthConfig, ClientOptions, RetryPolicy},
	error::AuthError,
	http::ReqwestHttpClient,
	oauth::TokenExchange,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

#[derive(Debug, Default)]
struct CacheState {
	credential: Option<Credential>,
	// Outcome of the latest exchange when it failed; cleared by the next success.
	failure: Option<AuthError>,
	generation: u64,
}

/// Obtains, caches, and refreshes the access credential for one application.
pub struct CredentialManager {
	exchange: TokenExchange,
	environment_label: &'static str,
	state: RwLock<CacheState>,
	refresh_guard: AsyncMutex<()>,
	refresh_window: Duration,
	retry: RetryPolicy,
	/// Exchange and cache counters.
	pub metrics: CredentialMetrics,
}
impl CredentialManager {
	/// Builds a manager for `config`; nothing is fetched until the first call.
	pub fn new(
		config: &AuthConfig,
		options: &ClientOptions,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		config.validate()?;
		options.validate()?;

		Ok(Self {
			exchange: TokenExchange::from_config(config, http_client, options.request_timeout)?,
			environment_label: config.environment.as_str(),
			state: RwLock::new(CacheState::default()),
			refresh_guard: AsyncMutex::new(()),
			refresh_window: options.refresh_window,
			retry: options.retry.clone(),
			metrics: CredentialMetrics::default(),
		})
	}

	/// Performs a fresh exchange, coalesced with any exchange already in flight.
	pub async fn acquire(&self) -> Result<Credential> {
		let observed = self.state.read().generation;

		self.refresh(observed).await
	}

	/// Returns the cached credential, re-acquiring it when missing, expired, or inside the
	/// refresh window.
	pub async fn current_token(&self) -> Result<Credential> {
		let observed = {
			let state = self.state.read();

			if let Some(credential) = state
				.credential
				.as_ref()
				.filter(|credential| credential.is_usable_at(OffsetDateTime::now_utc(), self.refresh_window))
			{
				self.metrics.record_reuse();

				return Ok(credential.clone());
			}

			state.generation
		};

		self.refresh(observed).await
	}

	/// Drops the cached credential if it is still `rejected`.
	///
	/// Returns `true` when this call performed the invalidation; `false` means another caller
	/// already did (or a newer credential replaced it), so no extra exchange is needed.
	pub fn invalidate(&self, rejected: &Credential) -> bool {
		let mut state = self.state.write();

		if state.credential.as_ref().is_some_and(|cached| cached.access_token == rejected.access_token)
		{
			state.credential = None;

			self.metrics.record_invalidation();
			obs::credential_invalidated(&rejected.access_token.fingerprint());

			return true;
		}

		false
	}

	/// Returns a snapshot of the cached credential without triggering an exchange.
	pub fn cached(&self) -> Option<Credential> {
		self.state.read().credential.clone()
	}

	async fn refresh(&self, observed: u64) -> Result<Credential> {
		let _singleflight = self.refresh_guard.lock().await;

		{
			let state = self.state.read();

			if state.generation != observed {
				if let Some(credential) = state.credential.as_ref() {
					self.metrics.record_reuse();

					return Ok(credential.clone());
				}
				if let Some(failure) = state.failure.as_ref() {
					return Err(failure.clone().into());
				}
			}
		}

		let outcome = self.exchange_with_retry().await;
		let mut state = self.state.write();

		state.generation = state.generation.wrapping_add(1);

		match outcome {
			Ok(credential) => {
				state.credential = Some(credential.clone());
				state.failure = None;

				Ok(credential)
			},
			Err(failure) => {
				state.failure = Some(failure.clone());

				Err(failure.into())
			},
		}
	}

	async fn exchange_with_retry(&self) -> Result<Credential, AuthError> {
		const KIND: OperationKind = OperationKind::TokenExchange;

		let span = OperationSpan::new(KIND, "exchange");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async {
				let mut attempt = 0;

				loop {
					self.metrics.record_exchange();

					match self.exchange.exchange().await {
						Ok(credential) => {
							obs::credential_issued(credential.expires_at);

							return Ok(credential);
						},
						Err(err) if err.is_transient() && self.retry.allows(attempt) => {
							let delay = self.retry.delay_for(attempt, err.retry_after());

							obs::retry_scheduled(KIND, attempt, delay, &err);
							obs::record_retry(KIND, err.status());
							tokio::time::sleep(delay).await;

							attempt += 1;
						},
						Err(err) => {
							self.metrics.record_failure();

							return Err(err);
						},
					}
				}
			})
			.await;

		if let Err(err) = &result {
			obs::operation_failed(KIND, err.status(), err);
		}

		obs::record_result(KIND, &result);

		result
	}
}
impl Debug for CredentialManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManager")
			.field("exchange", &self.exchange)
			.field("environment", &self.environment_label)
			.field("cached", &self.state.read().credential.is_some())
			.field("refresh_window", &self.refresh_window)
			.finish()
	}
}
