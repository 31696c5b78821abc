//! Client configuration: application credentials, environment selection, and tunables.
//!
//! [`AuthConfig`] is the inbound configuration consumed once by
//! [`Client::init`](crate::Client::init). [`ClientOptions`] groups the knobs that shape
//! request execution (timeouts, retry budget, read-after-write behavior) and can differ
//! between clients sharing the same credentials.

pub mod policy;

pub use policy::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::ConfigError};

const SANDBOX_BASE_URL: &str = "https://sandbox.moip.com.br/";
const PRODUCTION_BASE_URL: &str = "https://api.moip.com.br/";
const TOKEN_PATH: &str = "oauth/token";

/// Remote environment the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Non-production environment; enables simulation hooks.
	#[default]
	Sandbox,
	/// Production environment.
	Production,
}
impl Environment {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Environment::Sandbox => "sandbox",
			Environment::Production => "production",
		}
	}

	/// Default API base URL for the environment.
	pub fn default_base_url(self) -> Url {
		let raw = match self {
			Environment::Sandbox => SANDBOX_BASE_URL,
			Environment::Production => PRODUCTION_BASE_URL,
		};

		Url::parse(raw).expect("Built-in base URLs are valid.")
	}

	/// Returns `true` for the sandbox environment.
	pub const fn is_sandbox(self) -> bool {
		matches!(self, Environment::Sandbox)
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How the application credentials are presented to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	#[default]
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Application credentials and endpoint selection.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
	/// Application identifier.
	pub client_id: String,
	/// Application secret; never logged.
	pub client_secret: String,
	/// Target environment.
	#[serde(default)]
	pub environment: Environment,
	/// Optional override for the API base URL.
	#[serde(default)]
	pub base_url: Option<Url>,
	/// Optional override for the token endpoint; defaults to `{base}/oauth/token`.
	#[serde(default)]
	pub token_url: Option<Url>,
	/// Client authentication method for the token endpoint.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
}
impl AuthConfig {
	/// Creates a sandbox configuration for the provided credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			environment: Environment::default(),
			base_url: None,
			token_url: None,
			client_auth_method: ClientAuthMethod::default(),
		}
	}

	/// Selects the target environment.
	pub fn with_environment(mut self, environment: Environment) -> Self {
		self.environment = environment;

		self
	}

	/// Overrides the API base URL.
	pub fn with_base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn with_token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Overrides the client authentication method.
	pub fn with_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Checks credentials and endpoint invariants.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingCredential { field: "client id" });
		}
		if self.client_secret.trim().is_empty() {
			return Err(ConfigError::MissingCredential { field: "client secret" });
		}

		validate_endpoint(&self.base_url())?;
		validate_endpoint(&self.token_endpoint()?)?;

		Ok(())
	}

	/// Resolved API base URL, always ending with a slash so joins stay under it.
	pub fn base_url(&self) -> Url {
		let mut url = self.base_url.clone().unwrap_or_else(|| self.environment.default_base_url());

		if !url.path().ends_with('/') {
			let path = format!("{}/", url.path());

			url.set_path(&path);
		}

		url
	}

	/// Resolved token endpoint.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		match &self.token_url {
			Some(url) => Ok(url.clone()),
			None => self
				.base_url()
				.join(TOKEN_PATH)
				.map_err(|source| ConfigError::InvalidEndpoint { source }),
		}
	}

	/// Stable fingerprint identifying equivalent configurations.
	///
	/// The fingerprint is a base64 (no padding) encoding of the SHA-256 digest of every field,
	/// so it can key shared caches without carrying the secret in clear text.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();
		let token = self.token_endpoint().map(|url| url.to_string()).unwrap_or_default();

		for part in [
			self.client_id.as_str(),
			self.client_secret.as_str(),
			self.environment.as_str(),
			self.base_url().as_str(),
			token.as_str(),
			match self.client_auth_method {
				ClientAuthMethod::ClientSecretBasic => "basic",
				ClientAuthMethod::ClientSecretPost => "post",
			},
		] {
			hasher.update(part.as_bytes());
			hasher.update([0]);
		}

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}
impl Debug for AuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("environment", &self.environment)
			.field("base_url", &self.base_url)
			.field("token_url", &self.token_url)
			.field("client_auth_method", &self.client_auth_method)
			.finish()
	}
}

/// Execution tunables for a [`Client`](crate::Client).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
	/// Per-request timeout applied to every HTTP call, token exchange included.
	pub request_timeout: StdDuration,
	/// Retry budget for transport failures and retry-safe 5xx responses.
	pub retry: RetryPolicy,
	/// Read-after-write settling and polling.
	pub read_after_write: ReadAfterWritePolicy,
	/// Cached tokens expiring within this window are refreshed before use.
	pub refresh_window: Duration,
}
impl ClientOptions {
	const DEFAULT_REFRESH_WINDOW: Duration = Duration::seconds(60);
	const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Overrides the per-request timeout.
	pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the retry policy.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Overrides the read-after-write policy.
	pub fn with_read_after_write(mut self, policy: ReadAfterWritePolicy) -> Self {
		self.read_after_write = policy;

		self
	}

	/// Overrides the preemptive refresh window; negative values clamp to zero.
	pub fn with_refresh_window(mut self, window: Duration) -> Self {
		self.refresh_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Checks that the tunables are usable.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.request_timeout.is_zero() {
			return Err(ConfigError::InvalidPolicy {
				reason: "request timeout must be positive".into(),
			});
		}

		self.retry.validate()?;
		self.read_after_write.validate()
	}
}
impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
			retry: RetryPolicy::default(),
			read_after_write: ReadAfterWritePolicy::default(),
			refresh_window: Self::DEFAULT_REFRESH_WINDOW,
		}
	}
}

fn validate_endpoint(url: &Url) -> Result<(), ConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::UnsupportedScheme { url: url.to_string() });
	}
	if url.cannot_be_a_base() {
		return Err(ConfigError::InvalidBaseUrl { url: url.to_string() });
	}

	Ok(())
}
