//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
use serde_json::Value as JsonValue;
// self
use moip_client::{
	AuthConfig, Client, ClientOptions,
	client::CredentialRegistry,
	config::{ReadAfterWritePolicy, RetryPolicy},
	url::Url,
};

pub const CLIENT_ID: &str = "app-test";
pub const CLIENT_SECRET: &str = "secret-test";
pub const TOKEN_PATH: &str = "/oauth/token";

/// Sandbox configuration pointing at `server`.
pub fn config(server: &MockServer) -> AuthConfig {
	AuthConfig::new(CLIENT_ID, CLIENT_SECRET)
		.with_base_url(Url::parse(&server.base_url()).expect("Mock base URL should parse."))
}

/// Options with millisecond backoff so retry tests stay fast.
pub fn fast_options() -> ClientOptions {
	ClientOptions::default()
		.with_retry(
			RetryPolicy::default()
				.with_max_retries(2)
				.with_delays(StdDuration::from_millis(1), StdDuration::from_millis(5))
				.with_jitter_percent(0),
		)
		.with_read_after_write(
			ReadAfterWritePolicy::default().with_polling(StdDuration::from_millis(1), 5),
		)
}

/// Registers a token endpoint answering with `token`.
pub async fn mock_token<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	let body = format!(
		"{{\"access_token\":\"{token}\",\"token_type\":\"bearer\",\"expires_in\":3600}}"
	);

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Builds a client against `server` with a private registry and fast retries.
pub async fn client(server: &MockServer) -> Client {
	client_with(server, fast_options()).await
}

/// Builds a client against `server` with `options` and a private registry.
pub async fn client_with(server: &MockServer, options: ClientOptions) -> Client {
	Client::builder(config(server))
		.options(options)
		.registry(Arc::new(CredentialRegistry::new()))
		.build()
		.await
		.expect("Client should initialize against the mock server.")
}

/// JSON payment fixture as the service returns it.
pub fn payment_json(id: &str, order_id: &str, status: &str, delay_capture: bool) -> JsonValue {
	serde_json::json!({
		"id": id,
		"status": status,
		"delayCapture": delay_capture,
		"amount": { "total": 7300, "currency": "BRL", "fees": 0, "refunds": 0, "liquid": 7300 },
		"installmentCount": 1,
		"fundingInstrument": {
			"method": "CREDIT_CARD",
			"creditCard": { "id": "CRC-1", "brand": "VISA", "first6": "401200", "last4": "1112" }
		},
		"events": [{ "type": format!("PAYMENT.{status}"), "createdAt": "2024-05-01T10:00:00.000-03" }],
		"receivers": [{ "type": "PRIMARY", "moipAccount": { "id": "MPA-1" } }],
		"createdAt": "2024-05-01T10:00:00.000-03",
		"updatedAt": "2024-05-01T10:00:01.000-03",
		"_links": {
			"self": { "href": format!("https://sandbox.moip.com.br/v2/payments/{id}") },
			"order": { "href": format!("https://sandbox.moip.com.br/v2/orders/{order_id}"), "title": order_id }
		}
	})
}
