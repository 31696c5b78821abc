//! Client-level error taxonomy shared by the credential manager, executor, and facades.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; nothing was sent.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential exchange failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure or timeout, surfaced after the retry budget is spent.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// The service rejected the request (4xx) or a client-side guard refused it.
	#[error(transparent)]
	Client(#[from] ClientError),
	/// The service failed (5xx), surfaced after the retry budget is spent.
	#[error(transparent)]
	Server(#[from] ServerError),
	/// A successful response could not be interpreted.
	#[error(transparent)]
	Validation(#[from] ValidationError),
}
impl Error {
	/// Returns the HTTP status attached to the failure, if the service produced one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Auth(e) => e.status(),
			Self::Client(e) => e.status(),
			Self::Server(e) => Some(e.status),
			Self::Validation(e) => e.status(),
			Self::Config(_) | Self::Network(_) => None,
		}
	}

	/// Returns `true` for a 404 rejection.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::Client(e) if e.is_not_found())
	}
}

/// Configuration and validation failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be used to build resource paths.
	#[error("Base URL `{url}` cannot carry resource paths.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Base URL uses a scheme other than http or https.
	#[error("Base URL `{url}` must use http or https.")]
	UnsupportedScheme {
		/// Offending URL.
		url: String,
	},
	/// An endpoint URL could not be parsed or joined.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Client identifier or secret was empty.
	#[error("The {field} must not be empty.")]
	MissingCredential {
		/// Which credential field was empty.
		field: &'static str,
	},
	/// Retry or polling bounds are out of range.
	#[error("Invalid policy: {reason}.")]
	InvalidPolicy {
		/// Human-readable explanation.
		reason: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Credential exchange failures.
///
/// Cloneable so one failed exchange can be handed to every caller that waited on it.
#[derive(Clone, Debug, ThisError)]
pub enum AuthError {
	/// The authorization endpoint rejected the application credentials.
	#[error("Authorization endpoint rejected the credentials: {reason}.")]
	Rejected {
		/// Reason reported by the token endpoint.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The authorization endpoint could not be reached.
	#[error("Authorization endpoint is unreachable.")]
	Unreachable(#[source] NetworkError),
	/// The authorization endpoint answered with an unexpected but possibly temporary failure.
	#[error("Authorization endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token response JSON could not be parsed.
	#[error("Authorization endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token response omitted `expires_in`.
	#[error("Token response is missing expires_in.")]
	MissingExpiresIn,
	/// Token response carried an unusable `expires_in`.
	#[error("The expires_in value is out of range.")]
	ExpiresInOutOfRange,
}
impl AuthError {
	/// Returns the HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::Unexpected { status, .. }
			| Self::MalformedResponse { status, .. } => *status,
			_ => None,
		}
	}

	/// Returns `true` when another exchange attempt may succeed.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Unreachable(_) => true,
			Self::Unexpected { status, .. } | Self::MalformedResponse { status, .. } =>
				matches!(status, None | Some(429) | Some(500..)),
			Self::Rejected { status, .. } => matches!(status, Some(429) | Some(500..)),
			Self::MissingExpiresIn | Self::ExpiresInOutOfRange => false,
		}
	}

	/// Retry-After hint supplied by the authorization endpoint.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Unexpected { retry_after, .. } => *retry_after,
			_ => None,
		}
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Clone, Debug, ThisError)]
pub enum NetworkError {
	/// The request exceeded its timeout.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: SharedError,
	},
	/// Underlying HTTP client reported a connection failure.
	#[error("Network error occurred while calling the service.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the service.")]
	Io(#[source] Arc<std::io::Error>),
}
impl NetworkError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Arc::new(src) }
	}

	/// Wraps a transport-specific timeout.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for NetworkError {
	fn from(e: std::io::Error) -> Self {
		Self::Io(Arc::new(e))
	}
}
impl From<ReqwestError> for NetworkError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::transport(e) }
	}
}

/// Field-level detail attached to a rejection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	/// Service error code (e.g. `ORD-003`).
	#[serde(default)]
	pub code: Option<String>,
	/// JSON path of the offending field.
	#[serde(default)]
	pub path: Option<String>,
	/// Human-readable description.
	#[serde(default)]
	pub description: Option<String>,
}

/// Caller-side failures: the request was rejected or refused.
#[derive(Debug, ThisError)]
pub enum ClientError {
	/// The service answered with a 4xx status.
	#[error("Service rejected the request with HTTP {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Best-effort summary built from the error payload.
		message: String,
		/// Field-level errors, when the service supplies them.
		errors: Vec<FieldError>,
		/// Raw error payload, when it was JSON.
		body: Option<JsonValue>,
	},
	/// A sandbox-only operation was invoked against production.
	#[error("The {operation} operation is only available in the sandbox environment.")]
	SandboxOnly {
		/// Operation label.
		operation: &'static str,
	},
}
impl ClientError {
	/// Returns the HTTP status of a rejection.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => Some(*status),
			Self::SandboxOnly { .. } => None,
		}
	}

	/// Returns `true` for a 404 rejection.
	pub fn is_not_found(&self) -> bool {
		self.status() == Some(404)
	}

	/// Returns `true` for a 409 rejection (duplicate idempotency key with a different payload).
	pub fn is_conflict(&self) -> bool {
		self.status() == Some(409)
	}

	/// Field-level errors, if any.
	pub fn errors(&self) -> &[FieldError] {
		match self {
			Self::Rejected { errors, .. } => errors,
			Self::SandboxOnly { .. } => &[],
		}
	}
}

/// Remote fault (5xx).
#[derive(Debug, ThisError)]
#[error("Service failed with HTTP {status}: {message}.")]
pub struct ServerError {
	/// HTTP status code.
	pub status: u16,
	/// Best-effort summary built from the response body.
	pub message: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}

/// A successful response that could not be interpreted.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// The body was not JSON.
	#[error("Service returned a non-JSON body with HTTP {status}.")]
	MalformedBody {
		/// HTTP status code.
		status: u16,
		/// Leading bytes of the body, lossily decoded.
		preview: String,
		/// Underlying parse failure.
		#[source]
		source: serde_json::Error,
	},
	/// The body was JSON but did not match the expected shape.
	#[error("Service response does not match the expected shape at `{path}`.")]
	UnexpectedShape {
		/// JSON path of the mismatch.
		path: String,
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ValidationError {
	/// Returns the HTTP status of the response that failed validation.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::MalformedBody { status, .. } | Self::UnexpectedShape { status, .. } =>
				Some(*status),
		}
	}

	pub(crate) fn from_path_error(
		status: u16,
		err: serde_path_to_error::Error<serde_json::Error>,
	) -> Self {
		let path = err.path().to_string();

		Self::UnexpectedShape { path, status, source: err.into_inner() }
	}
}
