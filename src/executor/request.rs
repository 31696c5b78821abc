//! Request and response values exchanged with an [`Execute`](crate::executor::Execute)
//! implementation.

// self
use crate::{_prelude::*, error::ValidationError, obs::OperationKind};

/// A resource call described independently of the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// Operation label used for spans, metrics, and error context.
	pub operation: OperationKind,
	/// HTTP method.
	pub method: Method,
	/// Path segments appended to the API base URL; each one is percent-encoded on its own.
	pub path: Vec<String>,
	/// Query parameters, in order.
	pub query: Vec<(String, String)>,
	/// JSON body, sent verbatim.
	pub body: Option<JsonValue>,
	/// Value for the `Idempotency-Key` header.
	pub idempotency_key: Option<String>,
}
impl ApiRequest {
	/// Creates a request with no body, query, or idempotency key.
	pub fn new<I, S>(operation: OperationKind, method: Method, path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			operation,
			method,
			path: path.into_iter().map(Into::into).collect(),
			query: Vec::new(),
			body: None,
			idempotency_key: None,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get<I, S>(operation: OperationKind, path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(operation, Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post<I, S>(operation: OperationKind, path: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(operation, Method::POST, path)
	}

	/// Attaches a JSON body.
	pub fn with_json(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Attaches an idempotency key.
	pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
		self.idempotency_key = Some(key.into());

		self
	}

	/// Returns `true` when repeating the request after a server fault cannot duplicate a
	/// side effect: reads, and writes the service deduplicates by idempotency key.
	pub fn is_retry_safe(&self) -> bool {
		self.method == Method::GET || self.idempotency_key.is_some()
	}
}

/// A successful (2xx) response.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Parsed JSON body; `null` when the body was empty.
	pub body: JsonValue,
}
impl ApiResponse {
	/// Deserializes the body, reporting the JSON path of the first mismatch.
	pub fn into_json<T>(self) -> Result<T, ValidationError>
	where
		T: DeserializeOwned,
	{
		let status = self.status;

		serde_path_to_error::deserialize(self.body)
			.map_err(|err| ValidationError::from_path_error(status, err))
	}
}
