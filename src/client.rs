//! Single entry point: one-time initialization plus the resource facades.
//!
//! [`Client::init`] validates the configuration, obtains a usable token, and returns a
//! client exposing [`order`](Client::order), [`payment`](Client::payment), and
//! [`escrow`](Client::escrow). Equivalent configurations share one [`CredentialManager`]
//! through a [`CredentialRegistry`], so repeated initialization reuses the cached token
//! instead of exchanging credentials again.

// std
use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	auth::CredentialManager,
	config::{AuthConfig, ClientOptions, Environment},
	executor::{Execute, RequestExecutor},
	http::ReqwestHttpClient,
	resource::{EscrowFacade, OrderFacade, PaymentFacade},
};

/// Credential managers shared across clients, keyed by [`AuthConfig::fingerprint`].
///
/// A reused manager keeps the HTTP client, retry policy, and refresh window of the client
/// that created it.
#[derive(Debug, Default)]
pub struct CredentialRegistry {
	managers: Mutex<HashMap<String, Arc<CredentialManager>>>,
}
impl CredentialRegistry {
	/// Creates an empty, private registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Process-wide registry used by [`Client::init`].
	pub fn global() -> Arc<Self> {
		static GLOBAL: OnceLock<Arc<CredentialRegistry>> = OnceLock::new();

		Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
	}

	/// Returns the manager registered for `config`, building it with `build` on first use.
	pub fn get_or_try_insert<F>(&self, config: &AuthConfig, build: F) -> Result<Arc<CredentialManager>>
	where
		F: FnOnce() -> Result<CredentialManager>,
	{
		let fingerprint = config.fingerprint();
		let mut managers = self.managers.lock();

		if let Some(existing) = managers.get(&fingerprint) {
			return Ok(Arc::clone(existing));
		}

		let manager = Arc::new(build()?);

		managers.insert(fingerprint, Arc::clone(&manager));

		Ok(manager)
	}

	/// Drops the manager registered for `config`; clients already holding it keep working.
	pub fn forget(&self, config: &AuthConfig) -> bool {
		self.managers.lock().remove(&config.fingerprint()).is_some()
	}

	/// Drops every registered manager.
	pub fn clear(&self) {
		self.managers.lock().clear();
	}

	/// Number of registered managers.
	pub fn len(&self) -> usize {
		self.managers.lock().len()
	}

	/// Returns `true` when nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.managers.lock().is_empty()
	}
}

/// Initialized client exposing the resource facades.
#[derive(Clone, Debug)]
pub struct Client {
	/// Order endpoints.
	pub order: OrderFacade,
	/// Payment endpoints.
	pub payment: PaymentFacade,
	/// Escrow endpoints.
	pub escrow: EscrowFacade,
	credentials: Arc<CredentialManager>,
	environment: Environment,
}
impl Client {
	/// Validates `config`, awaits a usable token, and returns a ready client.
	///
	/// Uses default [`ClientOptions`] and the process-wide [`CredentialRegistry`].
	pub async fn init(config: AuthConfig) -> Result<Self> {
		Self::builder(config).build().await
	}

	/// Starts a builder for custom options, HTTP client, or registry.
	pub fn builder(config: AuthConfig) -> ClientBuilder {
		ClientBuilder::new(config)
	}

	/// Credential manager backing this client.
	pub fn credentials(&self) -> &Arc<CredentialManager> {
		&self.credentials
	}

	/// Environment the client talks to.
	pub fn environment(&self) -> Environment {
		self.environment
	}
}

/// Builder returned by [`Client::builder`].
#[derive(Debug)]
pub struct ClientBuilder {
	config: AuthConfig,
	options: ClientOptions,
	http_client: Option<ReqwestHttpClient>,
	registry: Option<Arc<CredentialRegistry>>,
}
impl ClientBuilder {
	/// Creates a builder with default options.
	pub fn new(config: AuthConfig) -> Self {
		Self { config, options: ClientOptions::default(), http_client: None, registry: None }
	}

	/// Overrides the execution options.
	pub fn options(mut self, options: ClientOptions) -> Self {
		self.options = options;

		self
	}

	/// Uses a caller-provided reqwest client; configure it not to follow redirects.
	pub fn http_client(mut self, client: ReqwestClient) -> Self {
		self.http_client = Some(ReqwestHttpClient::with_client(client));

		self
	}

	/// Uses `registry` instead of the process-wide one.
	pub fn registry(mut self, registry: Arc<CredentialRegistry>) -> Self {
		self.registry = Some(registry);

		self
	}

	/// Validates the configuration, awaits a usable token, and assembles the client.
	pub async fn build(self) -> Result<Client> {
		let Self { config, options, http_client, registry } = self;

		config.validate()?;
		options.validate()?;

		let http_client = match http_client {
			Some(client) => client,
			None => ReqwestHttpClient::new()?,
		};
		let registry = registry.unwrap_or_else(CredentialRegistry::global);
		let credentials = registry.get_or_try_insert(&config, || {
			CredentialManager::new(&config, &options, http_client.clone())
		})?;

		credentials.current_token().await?;

		let executor: Arc<dyn Execute> = Arc::new(RequestExecutor::new(
			Arc::clone(&credentials),
			http_client,
			&config,
			&options,
		)?);

		Ok(Client {
			order: OrderFacade::new(Arc::clone(&executor), options.read_after_write.clone()),
			payment: PaymentFacade::new(Arc::clone(&executor), options.read_after_write.clone()),
			escrow: EscrowFacade::new(executor),
			credentials,
			environment: config.environment,
		})
	}
}
