//! Walks an order through a pre-authorized payment with escrow, capture, and escrow release
//! against a local mock of the sandbox endpoints.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use moip_client::{
	AuthConfig, Client,
	client::CredentialRegistry,
	resource::{CreditCard, CustomerSpec, FundingInstrument, OrderItem, OrderSpec, OwnId, PaymentSpec, Status},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let payment = |status: &str| {
		json!({
			"id": "PAY-DEMO",
			"status": status,
			"delayCapture": true,
			"amount": { "total": 7300, "currency": "BRL" },
			"escrows": [{ "id": "ECW-DEMO", "status": "HOLD_PENDING", "amount": 7300 }],
			"_links": { "order": { "href": server.url("/v2/orders/ORD-DEMO"), "title": "ORD-DEMO" } }
		})
	};
	let _order_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/orders");
			then.status(201)
				.json_body(json!({ "id": "ORD-DEMO", "ownId": "demo-order", "status": "CREATED" }));
		})
		.await;
	let _payment_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/orders/ORD-DEMO/payments");
			then.status(201).json_body(payment("PRE_AUTHORIZED"));
		})
		.await;
	let _capture_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/payments/PAY-DEMO/capture");
			then.status(200).json_body(payment("AUTHORIZED"));
		})
		.await;
	let _release_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v2/escrows/ECW-DEMO/release");
			then.status(200).json_body(json!({ "id": "ECW-DEMO", "status": "RELEASED", "amount": 7300 }));
		})
		.await;
	let config = AuthConfig::new("demo-app", "demo-secret").with_base_url(Url::parse(&server.base_url())?);
	let client = Client::builder(config).registry(Arc::new(CredentialRegistry::new())).build().await?;
	let order = client
		.order
		.create(
			&OrderSpec::new(
				OwnId::new("demo-order")?,
				CustomerSpec::new(OwnId::new("demo-customer")?, "Jose Silva", "jose@example.com"),
			)
			.with_currency("BRL")
			.with_item(OrderItem::new("Camiseta", 1, 7300)),
		)
		.await?;
	let card = CreditCard { hash: Some("encrypted-card-hash".into()), ..Default::default() };
	let spec = PaymentSpec::new(FundingInstrument::credit_card(card))
		.with_installment_count(1)
		.with_delay_capture(true)
		.with_escrow("Held until delivery");
	let created = client.payment.create(&order.id, &spec).await?;

	println!("Payment {} is {}.", created.id, created.status);

	let captured = client.payment.pre_authorization_capture(&created.id).await?;

	assert_eq!(captured.status, Status::AUTHORIZED);

	let escrow = captured.escrows.first().ok_or_else(|| color_eyre::eyre::eyre!("Missing escrow."))?;
	let released = client.escrow.release(&escrow.id).await?;

	println!("Escrow {} is {}.", released.id, released.status);

	token_mock.assert_async().await;

	Ok(())
}
