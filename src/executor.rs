//! Authenticated request execution.
//!
//! Resource facades describe calls as [`ApiRequest`] values and hand them to an
//! [`Execute`] implementation. [`RequestExecutor`] is the production implementation: it
//! attaches the cached credential, sends JSON over the shared reqwest client, retries
//! transport failures and retry-safe server faults with bounded backoff, recovers once from
//! a 401 by re-acquiring the credential, and maps every outcome into the crate's
//! [`Error`] taxonomy.

pub mod request;

pub use request::*;

// crates.io
use reqwest::{
	StatusCode,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, CredentialManager},
	config::{AuthConfig, ClientOptions, Environment, RetryPolicy},
	error::{ClientError, ConfigError, FieldError, NetworkError, ServerError, ValidationError},
	http::{self, ReqwestHttpClient},
	obs::{self, OperationOutcome, OperationSpan},
};

const JSON_MEDIA_TYPE: &str = "application/json";
const IDEMPOTENCY_KEY: &str = "Idempotency-Key";
const BODY_PREVIEW_LIMIT: usize = 256;

/// Future returned by [`Execute::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Narrow seam between resource facades and the transport.
pub trait Execute
where
	Self: Send + Sync,
{
	/// Sends `request` and resolves to the successful response or a typed failure.
	fn execute(&self, request: ApiRequest) -> ExecuteFuture<'_>;

	/// Environment the requests are sent to.
	fn environment(&self) -> Environment;
}

/// Default [`Execute`] implementation backed by reqwest and a [`CredentialManager`].
pub struct RequestExecutor {
	credentials: Arc<CredentialManager>,
	http_client: ReqwestHttpClient,
	base_url: Url,
	environment: Environment,
	timeout: StdDuration,
	retry: RetryPolicy,
}
impl RequestExecutor {
	/// Builds an executor that sends requests under `config`'s base URL.
	pub fn new(
		credentials: Arc<CredentialManager>,
		http_client: ReqwestHttpClient,
		config: &AuthConfig,
		options: &ClientOptions,
	) -> Result<Self> {
		config.validate()?;
		options.validate()?;

		Ok(Self {
			credentials,
			http_client,
			base_url: config.base_url(),
			environment: config.environment,
			timeout: options.request_timeout,
			retry: options.retry.clone(),
		})
	}

	/// Credential manager shared by this executor.
	pub fn credentials(&self) -> &Arc<CredentialManager> {
		&self.credentials
	}

	/// Resolves the absolute URL for `request`.
	pub fn endpoint(&self, request: &ApiRequest) -> Result<Url, ConfigError> {
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|()| ConfigError::InvalidBaseUrl { url: self.base_url.to_string() })?
			.pop_if_empty()
			.extend(&request.path);

		if !request.query.is_empty() {
			url.query_pairs_mut()
				.extend_pairs(request.query.iter().map(|(key, value)| (key.as_str(), value.as_str())));
		}

		Ok(url)
	}

	async fn run(&self, request: ApiRequest) -> Result<ApiResponse> {
		let kind = request.operation;
		let span = OperationSpan::new(kind, "execute");

		obs::record_operation_outcome(kind, OperationOutcome::Attempt);

		let result = span.instrument(self.run_with_recovery(&request)).await;

		if let Err(err) = &result {
			obs::operation_failed(kind, err.status(), err);
		}

		obs::record_result(kind, &result);

		result
	}

	async fn run_with_recovery(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let url = self.endpoint(request)?;
		let body = request
			.body
			.as_ref()
			.map(serde_json::to_vec)
			.transpose()
			.map_err(ConfigError::RequestBody)?;
		let mut credential = self.credentials.current_token().await?;
		let mut reauthenticated = false;
		let mut attempt = 0;

		loop {
			match self.send_once(request, &url, body.as_deref(), &credential).await {
				Ok(response) => return Ok(response),
				Err(Failure::Unauthorized(_)) if !reauthenticated => {
					reauthenticated = true;

					self.credentials.invalidate(&credential);

					credential = self.credentials.current_token().await?;
				},
				Err(Failure::Retryable { error, retry_after }) if self.retry.allows(attempt) => {
					let delay = self.retry.delay_for(attempt, retry_after);

					obs::retry_scheduled(request.operation, attempt, delay, &error);
					obs::record_retry(request.operation, error.status());
					tokio::time::sleep(delay).await;

					attempt += 1;
				},
				Err(failure) => return Err(failure.into_error()),
			}
		}
	}

	async fn send_once(
		&self,
		request: &ApiRequest,
		url: &Url,
		body: Option<&[u8]>,
		credential: &Credential,
	) -> Result<ApiResponse, Failure> {
		let mut builder = self
			.http_client
			.request(request.method.clone(), url.clone())
			.timeout(self.timeout)
			.header(AUTHORIZATION, credential.authorization_header())
			.header(ACCEPT, JSON_MEDIA_TYPE)
			.header(CONTENT_TYPE, JSON_MEDIA_TYPE);

		if let Some(key) = &request.idempotency_key {
			builder = builder.header(IDEMPOTENCY_KEY, key.as_str());
		}
		if let Some(body) = body {
			builder = builder.body(body.to_vec());
		}

		let response = builder.send().await.map_err(Failure::transport)?;
		let status = response.status();
		let retry_after = http::parse_retry_after(response.headers());
		let bytes = response.bytes().await.map_err(Failure::transport)?;

		classify(request, status, retry_after, &bytes)
	}
}
impl Execute for RequestExecutor {
	fn execute(&self, request: ApiRequest) -> ExecuteFuture<'_> {
		Box::pin(self.run(request))
	}

	fn environment(&self) -> Environment {
		self.environment
	}
}
impl Debug for RequestExecutor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("base_url", &self.base_url.as_str())
			.field("environment", &self.environment)
			.field("timeout", &self.timeout)
			.field("retry", &self.retry)
			.finish()
	}
}

/// Outcome of a single attempt that did not produce a usable response.
#[derive(Debug)]
enum Failure {
	/// The service rejected the credential.
	Unauthorized(ClientError),
	/// Another attempt may succeed.
	Retryable { error: Error, retry_after: Option<Duration> },
	/// Surfaced as-is.
	Fatal(Error),
}
impl Failure {
	fn transport(err: ReqwestError) -> Self {
		Self::Retryable { error: NetworkError::from(err).into(), retry_after: None }
	}

	fn into_error(self) -> Error {
		match self {
			Self::Unauthorized(err) => err.into(),
			Self::Retryable { error, .. } | Self::Fatal(error) => error,
		}
	}
}

fn classify(
	request: &ApiRequest,
	status: StatusCode,
	retry_after: Option<Duration>,
	bytes: &[u8],
) -> Result<ApiResponse, Failure> {
	let code = status.as_u16();

	if status.is_success() {
		return parse_success(code, bytes).map_err(|err| Failure::Fatal(err.into()));
	}

	let payload = ErrorPayload::parse(bytes);
	let message = payload.summary(status);

	if status.is_server_error() {
		let error = Error::from(ServerError { status: code, message, retry_after });

		return Err(if request.is_retry_safe() {
			Failure::Retryable { error, retry_after }
		} else {
			Failure::Fatal(error)
		});
	}
	if status.is_client_error() {
		let rejection = ClientError::Rejected {
			status: code,
			message,
			errors: payload.errors,
			body: payload.raw,
		};

		return Err(if status == StatusCode::UNAUTHORIZED {
			Failure::Unauthorized(rejection)
		} else {
			Failure::Fatal(rejection.into())
		});
	}

	// Redirects are disabled, so anything else is an unexpected answer.
	Err(Failure::Fatal(ServerError { status: code, message, retry_after: None }.into()))
}

fn parse_success(status: u16, bytes: &[u8]) -> Result<ApiResponse, ValidationError> {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(ApiResponse { status, body: JsonValue::Null });
	}

	serde_json::from_slice(bytes).map(|body| ApiResponse { status, body }).map_err(|source| {
		ValidationError::MalformedBody { status, preview: preview(bytes), source }
	})
}

fn preview(bytes: &[u8]) -> String {
	let end = bytes.len().min(BODY_PREVIEW_LIMIT);

	String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Error payload shapes produced by the service.
#[derive(Debug, Default)]
struct ErrorPayload {
	errors: Vec<FieldError>,
	error: Option<String>,
	description: Option<String>,
	raw: Option<JsonValue>,
	text: Option<String>,
}
impl ErrorPayload {
	fn parse(bytes: &[u8]) -> Self {
		#[derive(Deserialize)]
		struct Shape {
			#[serde(default)]
			errors: Vec<FieldError>,
			#[serde(default)]
			error: Option<String>,
			#[serde(default, alias = "message")]
			description: Option<String>,
		}

		let Ok(raw) = serde_json::from_slice::<JsonValue>(bytes) else {
			let text = String::from_utf8_lossy(bytes).trim().to_owned();

			return Self {
				text: (!text.is_empty()).then(|| preview(text.as_bytes())),
				..Self::default()
			};
		};
		let shape = Shape::deserialize(&raw).ok();

		match shape {
			Some(Shape { errors, error, description }) =>
				Self { errors, error, description, raw: Some(raw), text: None },
			None => Self { raw: Some(raw), ..Self::default() },
		}
	}

	fn summary(&self, status: StatusCode) -> String {
		let described = self
			.errors
			.iter()
			.filter_map(|field| field.description.as_deref().or(field.code.as_deref()))
			.collect::<Vec<_>>();

		if !described.is_empty() {
			return described.join("; ");
		}

		match (&self.error, &self.description) {
			(Some(error), Some(description)) => format!("{error}: {description}"),
			(Some(single), None) | (None, Some(single)) => single.clone(),
			(None, None) => self
				.text
				.clone()
				.or_else(|| status.canonical_reason().map(str::to_owned))
				.unwrap_or_else(|| "no error details".into()),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::obs::OperationKind;

	fn executor(base: &str) -> RequestExecutor {
		let config = AuthConfig::new("app", "secret")
			.with_base_url(Url::parse(base).expect("Base URL fixture should parse."));
		let options = ClientOptions::default();
		let http_client = ReqwestHttpClient::new().expect("HTTP client should build.");
		let credentials = Arc::new(
			CredentialManager::new(&config, &options, http_client.clone())
				.expect("Credential manager should build."),
		);

		RequestExecutor::new(credentials, http_client, &config, &options)
			.expect("Executor should build.")
	}

	#[test]
	fn endpoint_encodes_segments_and_query() {
		let executor = executor("http://127.0.0.1:9/gateway");
		let request = ApiRequest::get(OperationKind::PaymentAuthorize, ["simulador", "authorize"])
			.with_query("payment_id", "PAY-1")
			.with_query("amount", "1000");

		assert_eq!(
			executor.endpoint(&request).expect("Endpoint should resolve.").as_str(),
			"http://127.0.0.1:9/gateway/simulador/authorize?payment_id=PAY-1&amount=1000"
		);

		let odd = ApiRequest::get(OperationKind::PaymentGet, ["v2", "payments", "a/b"]);

		assert_eq!(
			executor.endpoint(&odd).expect("Endpoint should resolve.").as_str(),
			"http://127.0.0.1:9/gateway/v2/payments/a%2Fb"
		);
	}

	#[test]
	fn classify_maps_status_families() {
		let read = ApiRequest::get(OperationKind::PaymentGet, ["v2", "payments", "PAY-1"]);
		let capture = ApiRequest::post(OperationKind::PaymentCapture, ["v2", "payments", "PAY-1"]);

		assert!(matches!(
			classify(&read, StatusCode::OK, None, b""),
			Ok(ApiResponse { status: 200, body: JsonValue::Null })
		));
		assert!(matches!(
			classify(&read, StatusCode::OK, None, b"<html>"),
			Err(Failure::Fatal(Error::Validation(ValidationError::MalformedBody { .. })))
		));
		assert!(matches!(
			classify(&read, StatusCode::SERVICE_UNAVAILABLE, None, b""),
			Err(Failure::Retryable { error: Error::Server(_), .. })
		));
		assert!(matches!(
			classify(&capture, StatusCode::BAD_GATEWAY, None, b""),
			Err(Failure::Fatal(Error::Server(_)))
		));
		assert!(matches!(
			classify(&capture, StatusCode::UNAUTHORIZED, None, b""),
			Err(Failure::Unauthorized(_))
		));
	}

	#[test]
	fn error_payloads_surface_field_details() {
		let request = ApiRequest::post(OperationKind::PaymentCancel, ["v2", "payments", "PAY-1"]);
		let body = br#"{"errors":[{"code":"PAY-999","path":"status","description":"Payment cannot be voided"}]}"#;
		let error = classify(&request, StatusCode::BAD_REQUEST, None, body)
			.expect_err("400 must fail.")
			.into_error();

		match error {
			Error::Client(ClientError::Rejected { status, message, errors, body }) => {
				assert_eq!(status, 400);
				assert_eq!(message, "Payment cannot be voided");
				assert_eq!(errors[0].code.as_deref(), Some("PAY-999"));
				assert!(body.is_some());
			},
			other => panic!("Unexpected error: {other:?}."),
		}

		let flat = ErrorPayload::parse(br#"{"error":"invalid_token","description":"expired"}"#);

		assert_eq!(flat.summary(StatusCode::UNAUTHORIZED), "invalid_token: expired");
		assert_eq!(ErrorPayload::parse(b"").summary(StatusCode::NOT_FOUND), "Not Found");
		assert_eq!(ErrorPayload::parse(b"gateway down").summary(StatusCode::NOT_FOUND), "gateway down");
	}
}
