mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use moip_client::{Client, Error, client::CredentialRegistry, error::AuthError};

#[tokio::test]
async fn repeated_init_reuses_cached_credentials() {
	let server = MockServer::start_async().await;
	let token = common::mock_token(&server, "registry-token").await;
	let registry = Arc::new(CredentialRegistry::new());
	let first = Client::builder(common::config(&server))
		.options(common::fast_options())
		.registry(Arc::clone(&registry))
		.build()
		.await
		.expect("First init should succeed.");
	let second = Client::builder(common::config(&server))
		.registry(Arc::clone(&registry))
		.build()
		.await
		.expect("Second init should succeed.");

	assert!(Arc::ptr_eq(first.credentials(), second.credentials()));
	assert_eq!(registry.len(), 1);

	token.assert_calls_async(1).await;

	registry.forget(&common::config(&server));

	let third = Client::builder(common::config(&server))
		.registry(Arc::clone(&registry))
		.build()
		.await
		.expect("Init after forget should succeed.");

	assert!(!Arc::ptr_eq(first.credentials(), third.credentials()));

	token.assert_calls_async(2).await;
}

#[tokio::test]
async fn concurrent_init_triggers_one_exchange() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(common::TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(100))
				.body("{\"access_token\":\"init-token\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let registry = Arc::new(CredentialRegistry::new());
	let build = || {
		Client::builder(common::config(&server))
			.options(common::fast_options())
			.registry(Arc::clone(&registry))
			.build()
	};
	let (first, second, third) = tokio::join!(build(), build(), build());

	for client in [first, second, third] {
		let client = client.expect("Concurrent init should succeed.");
		let credential = client.credentials().cached().expect("Init leaves a cached token.");

		assert_eq!(credential.access_token.expose(), "init-token");
	}

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn init_surfaces_rejected_credentials() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(common::TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let err = Client::builder(common::config(&server))
		.options(common::fast_options())
		.registry(Arc::new(CredentialRegistry::new()))
		.build()
		.await
		.expect_err("Rejected credentials must fail init.");

	assert!(matches!(err, Error::Auth(AuthError::Rejected { status: Some(400), .. })));

	token.assert_calls_async(1).await;
}

#[tokio::test]
async fn client_secret_post_moves_credentials_into_the_form() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(common::TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("client_secret", "secret-test");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"post-token\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let config = common::config(&server)
		.with_client_auth_method(moip_client::config::ClientAuthMethod::ClientSecretPost);
	let client = Client::builder(config)
		.options(common::fast_options())
		.registry(Arc::new(CredentialRegistry::new()))
		.build()
		.await
		.expect("Form-authenticated init should succeed.");

	assert_eq!(client.environment(), moip_client::Environment::Sandbox);

	token.assert_calls_async(1).await;
}
