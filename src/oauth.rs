//! Client-credentials exchange against the authorization endpoint.
//!
//! [`TokenExchange`] owns a configured `oauth2` client and converts its responses and
//! failures into [`Credential`] values and [`AuthError`]s.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{
		BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::{AuthConfig, ClientAuthMethod},
	error::{AuthError, ConfigError, NetworkError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Performs the client-credentials grant for one application.
pub struct TokenExchange {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
	token_url: Url,
	timeout: StdDuration,
}
impl TokenExchange {
	/// Builds an exchange for the configured token endpoint.
	pub fn from_config(
		config: &AuthConfig,
		http_client: ReqwestHttpClient,
		timeout: StdDuration,
	) -> Result<Self> {
		let endpoint = config.token_endpoint()?;
		let token_url = TokenUrl::new(endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_token_uri(token_url);

		if matches!(config.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, token_url: endpoint, timeout })
	}

	/// Runs one exchange; no retries happen here.
	pub async fn exchange(&self) -> Result<Credential, AuthError> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone(), self.timeout);
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}
}
impl Debug for TokenExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchange")
			.field("token_url", &self.token_url.as_str())
			.field("timeout", &self.timeout)
			.finish()
	}
}

fn map_token_response(response: BasicTokenResponse) -> Result<Credential, AuthError> {
	let expires_in = response.expires_in().ok_or(AuthError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| AuthError::ExpiresInOutOfRange)?;
	let token_type = match response.token_type() {
		BasicTokenType::Bearer => "Bearer",
		BasicTokenType::Mac => "MAC",
		BasicTokenType::Extension(value) => value.as_str(),
	};

	Credential::issued(
		response.access_token().secret().to_owned(),
		Some(token_type),
		OffsetDateTime::now_utc(),
		Duration::seconds(expires_in),
	)
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> AuthError {
	let meta = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response(response, meta),
		RequestTokenError::Request(error) => map_transport_error(meta, error),
		RequestTokenError::Parse(source, _body) =>
			AuthError::MalformedResponse { source: Arc::new(source), status: meta_status(meta) },
		RequestTokenError::Other(message) => AuthError::Unexpected {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		},
	}
}

fn map_server_response(response: BasicErrorResponse, meta: Option<&ResponseMetadata>) -> AuthError {
	let reason = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};
	let status = meta_status(meta);

	match status {
		Some(429) | Some(500..) =>
			AuthError::Unexpected { message: reason, status, retry_after: meta_retry_after(meta) },
		_ => AuthError::Rejected { reason, status },
	}
}

fn map_transport_error(
	meta: Option<&ResponseMetadata>,
	err: HttpClientError<ReqwestError>,
) -> AuthError {
	match err {
		HttpClientError::Reqwest(inner) => AuthError::Unreachable(NetworkError::from(*inner)),
		HttpClientError::Io(inner) => AuthError::Unreachable(NetworkError::from(inner)),
		HttpClientError::Http(inner) => AuthError::Unexpected {
			message: format!("token request could not be built: {inner}"),
			status: None,
			retry_after: None,
		},
		HttpClientError::Other(message) => AuthError::Unexpected {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		},
		_ => AuthError::Unexpected {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		},
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn exchange(method: ClientAuthMethod) -> Result<TokenExchange> {
		let config = AuthConfig::new("app-id", "app-secret").with_client_auth_method(method);

		TokenExchange::from_config(
			&config,
			ReqwestHttpClient::new().expect("Default HTTP client should build."),
			StdDuration::from_secs(5),
		)
	}

	#[test]
	fn builds_for_both_auth_methods() {
		let basic = exchange(ClientAuthMethod::ClientSecretBasic).expect("Basic auth should build.");
		let post = exchange(ClientAuthMethod::ClientSecretPost).expect("Post auth should build.");

		assert!(format!("{basic:?}").contains("https://sandbox.moip.com.br/oauth/token"));
		assert!(!format!("{post:?}").contains("app-secret"));
	}

	#[test]
	fn server_errors_classify_by_status() {
		let response: BasicErrorResponse =
			serde_json::from_str("{\"error\":\"invalid_client\",\"error_description\":\"bad key\"}")
				.expect("Error response fixture should parse.");
		let rejected = map_server_response(
			response.clone(),
			Some(&ResponseMetadata { status: Some(401), retry_after: None }),
		);

		assert!(matches!(rejected, AuthError::Rejected { status: Some(401), .. }));
		assert!(rejected.to_string().contains("invalid_client: bad key"));

		let unavailable = map_server_response(
			response,
			Some(&ResponseMetadata { status: Some(503), retry_after: Some(Duration::seconds(2)) }),
		);

		assert!(unavailable.is_transient());
		assert_eq!(unavailable.retry_after(), Some(Duration::seconds(2)));
	}
}
