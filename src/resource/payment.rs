//! Payments: creation against an order and the pre-authorization lifecycle.
//!
//! The client never infers a status transition from having issued a call; every status a
//! caller sees comes from a server response.

// self
use crate::{
	_prelude::*,
	config::ReadAfterWritePolicy,
	error::ClientError,
	executor::{ApiRequest, Execute},
	obs::OperationKind,
	resource::{self, Amount, Escrow, Links, OrderId, OwnId, PaymentId, Status, Timestamp},
};

/// Payment creation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSpec {
	/// Number of installments.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub installment_count: Option<u32>,
	/// Text shown on the buyer's card statement.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub statement_descriptor: Option<String>,
	/// How the payment is funded.
	pub funding_instrument: FundingInstrument,
	/// Reserve funds now and capture or cancel later; immutable once created.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delay_capture: Option<bool>,
	/// Receivers splitting the amount.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub receivers: Vec<Receiver>,
	/// Escrow terms; the created payment then lists its escrows.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub escrow: Option<EscrowSpec>,
	/// Key sent as the `Idempotency-Key` header; not part of the body.
	#[serde(skip)]
	pub idempotency_key: Option<OwnId>,
	/// Additional fields forwarded as-is.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl PaymentSpec {
	/// Creates a spec for `funding_instrument`.
	pub fn new(funding_instrument: FundingInstrument) -> Self {
		Self {
			installment_count: None,
			statement_descriptor: None,
			funding_instrument,
			delay_capture: None,
			receivers: Vec::new(),
			escrow: None,
			idempotency_key: None,
			extra: JsonMap::new(),
		}
	}

	/// Sets the installment count.
	pub fn with_installment_count(mut self, count: u32) -> Self {
		self.installment_count = Some(count);

		self
	}

	/// Sets the statement descriptor.
	pub fn with_statement_descriptor(mut self, descriptor: impl Into<String>) -> Self {
		self.statement_descriptor = Some(descriptor.into());

		self
	}

	/// Requests a pre-authorization instead of an immediate capture.
	pub fn with_delay_capture(mut self, delay_capture: bool) -> Self {
		self.delay_capture = Some(delay_capture);

		self
	}

	/// Appends a receiver.
	pub fn with_receiver(mut self, receiver: Receiver) -> Self {
		self.receivers.push(receiver);

		self
	}

	/// Attaches escrow terms.
	pub fn with_escrow(mut self, description: impl Into<String>) -> Self {
		self.escrow = Some(EscrowSpec { description: description.into() });

		self
	}

	/// Sets the idempotency key header.
	pub fn with_idempotency_key(mut self, key: OwnId) -> Self {
		self.idempotency_key = Some(key);

		self
	}

	/// Adds a field that is forwarded verbatim.
	pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.extra.insert(key.into(), value);

		self
	}
}

/// Escrow terms attached to a payment creation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSpec {
	/// Reason for holding the funds.
	pub description: String,
}

/// Funding instrument, used both in requests and in responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingInstrument {
	/// Funding method (`CREDIT_CARD`, `BOLETO`, ...).
	pub method: String,
	/// Card details for `CREDIT_CARD`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub credit_card: Option<CreditCard>,
	/// Remaining fields (`boleto`, `onlineBankDebit`, ...).
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl FundingInstrument {
	/// Credit card funding.
	pub fn credit_card(card: CreditCard) -> Self {
		Self { method: "CREDIT_CARD".into(), credit_card: Some(card), extra: JsonMap::new() }
	}
}

/// Card data; request fields are optional because the service also accepts a hash or a
/// stored card id, and responses carry only masked data.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
	/// Stored card identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Encrypted card hash.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hash: Option<String>,
	/// Clear card number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub number: Option<String>,
	/// Expiration month.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiration_month: Option<String>,
	/// Expiration year.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiration_year: Option<String>,
	/// Security code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cvc: Option<String>,
	/// Card holder (name, birth date, tax document, phone).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub holder: Option<JsonValue>,
	/// Remaining fields (`brand`, `first6`, `last4`, `store`, ...).
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl Debug for CreditCard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CreditCard")
			.field("id", &self.id)
			.field("hash", &self.hash.as_ref().map(|_| "<redacted>"))
			.field("number", &self.number.as_ref().map(|_| "<redacted>"))
			.field("expiration_month", &self.expiration_month)
			.field("expiration_year", &self.expiration_year)
			.field("cvc", &self.cvc.as_ref().map(|_| "<redacted>"))
			.field("extra", &self.extra)
			.finish_non_exhaustive()
	}
}

/// Account receiving part of a payment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
	/// Receiver role (`PRIMARY`, `SECONDARY`).
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	/// Receiving account reference.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub moip_account: Option<AccountRef>,
	/// Share of the amount (`fixed`, `percentual`) or the resolved totals.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount: Option<JsonValue>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Reference to a service account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountRef {
	/// Account identifier (`MPA-...`).
	pub id: String,
	/// Remaining fields (`login`, `fullname`).
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Entry of a payment's event history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
	/// Event type (`PAYMENT.AUTHORIZED`, ...).
	#[serde(rename = "type")]
	pub kind: String,
	/// When the event happened.
	#[serde(default)]
	pub created_at: Option<Timestamp>,
	/// Free-form description.
	#[serde(default)]
	pub description: Option<String>,
}

/// Payment as reported by the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
	/// Server-assigned identifier.
	pub id: PaymentId,
	/// Lifecycle status.
	pub status: Status,
	/// Whether the payment was created as a pre-authorization.
	#[serde(default)]
	pub delay_capture: bool,
	/// Amount breakdown.
	#[serde(default)]
	pub amount: Option<Amount>,
	/// Number of installments.
	#[serde(default)]
	pub installment_count: Option<u32>,
	/// Funding instrument with masked card data.
	#[serde(default)]
	pub funding_instrument: Option<FundingInstrument>,
	/// Receivers splitting the amount.
	#[serde(default)]
	pub receivers: Vec<Receiver>,
	/// Escrows created with the payment.
	#[serde(default)]
	pub escrows: Vec<Escrow>,
	/// Event history.
	#[serde(default)]
	pub events: Vec<PaymentEvent>,
	/// Creation instant.
	#[serde(default)]
	pub created_at: Option<Timestamp>,
	/// Last update instant.
	#[serde(default)]
	pub updated_at: Option<Timestamp>,
	/// Hypermedia links.
	#[serde(rename = "_links", default)]
	pub links: Links,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl Payment {
	/// Parent order, taken from the `order` link.
	pub fn order_id(&self) -> Option<OrderId> {
		self.links.title("order").and_then(|title| OrderId::new(title).ok())
	}
}

/// Payment endpoints.
pub struct PaymentFacade<E = dyn Execute>
where
	E: ?Sized,
{
	executor: Arc<E>,
	read_after_write: ReadAfterWritePolicy,
}
impl<E> PaymentFacade<E>
where
	E: ?Sized + Execute,
{
	/// Creates a facade over `executor`.
	pub fn new(executor: Arc<E>, read_after_write: ReadAfterWritePolicy) -> Self {
		Self { executor, read_after_write }
	}

	/// Creates a payment for an existing order (`POST v2/orders/{orderId}/payments`).
	pub async fn create(&self, order_id: &OrderId, spec: &PaymentSpec) -> Result<Payment> {
		let mut request = ApiRequest::post(
			OperationKind::PaymentCreate,
			["v2", "orders", order_id.as_str(), "payments"],
		)
		.with_json(resource::to_body(spec)?);

		if let Some(key) = &spec.idempotency_key {
			request = request.with_idempotency_key(key.as_str());
		}

		let payment = self.executor.execute(request).await?.into_json::<Payment>()?;

		resource::settle(&self.read_after_write).await;

		Ok(payment)
	}

	/// Reads a payment (`GET v2/payments/{id}`); unknown identifiers fail with a 404
	/// [`ClientError`].
	pub async fn get_one(&self, id: &PaymentId) -> Result<Payment> {
		let response = resource::read_with_retries(&*self.executor, &self.read_after_write, || {
			ApiRequest::get(OperationKind::PaymentGet, ["v2", "payments", id.as_str()])
		})
		.await?;

		Ok(response.into_json()?)
	}

	/// Captures a pre-authorized payment (`POST v2/payments/{id}/capture`).
	pub async fn pre_authorization_capture(&self, id: &PaymentId) -> Result<Payment> {
		self.transition(OperationKind::PaymentCapture, id, "capture").await
	}

	/// Cancels a pre-authorized payment (`POST v2/payments/{id}/void`).
	pub async fn pre_authorization_cancel(&self, id: &PaymentId) -> Result<Payment> {
		self.transition(OperationKind::PaymentCancel, id, "void").await
	}

	/// Asks the sandbox simulator to authorize `amount` cents of a payment
	/// (`GET simulador/authorize`).
	///
	/// Fails with [`ClientError::SandboxOnly`] without sending anything outside the sandbox.
	/// The call only requests the transition; read the payment to observe it.
	pub async fn authorize(&self, id: &PaymentId, amount: i64) -> Result<()> {
		const KIND: OperationKind = OperationKind::PaymentAuthorize;

		if !self.executor.environment().is_sandbox() {
			return Err(ClientError::SandboxOnly { operation: KIND.as_str() }.into());
		}

		let request = ApiRequest::get(KIND, ["simulador", "authorize"])
			.with_query("payment_id", id.as_str())
			.with_query("amount", amount.to_string());

		self.executor.execute(request).await?;

		Ok(())
	}

	/// Re-reads a payment until its status is one of `targets` or the poll budget is spent,
	/// returning the last observed payment either way.
	pub async fn poll_until(&self, id: &PaymentId, targets: &[Status]) -> Result<Payment> {
		let mut polls = 1;

		loop {
			let payment = self.get_one(id).await?;

			if payment.status.is_any_of(targets) || polls >= self.read_after_write.max_polls {
				return Ok(payment);
			}

			polls += 1;

			tokio::time::sleep(self.read_after_write.poll_interval).await;
		}
	}

	async fn transition(
		&self,
		kind: OperationKind,
		id: &PaymentId,
		action: &'static str,
	) -> Result<Payment> {
		let request = ApiRequest::post(kind, ["v2", "payments", id.as_str(), action]);

		Ok(self.executor.execute(request).await?.into_json()?)
	}
}
impl<E> Clone for PaymentFacade<E>
where
	E: ?Sized,
{
	fn clone(&self) -> Self {
		Self { executor: Arc::clone(&self.executor), read_after_write: self.read_after_write.clone() }
	}
}
impl<E> Debug for PaymentFacade<E>
where
	E: ?Sized,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PaymentFacade").field("read_after_write", &self.read_after_write).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{config::Environment, resource::fake::FakeExecutor};

	fn payment_id() -> PaymentId {
		PaymentId::new("PAY-1").expect("Payment id fixture should be valid.")
	}

	fn payment_body(status: &str) -> JsonValue {
		serde_json::json!({
			"id": "PAY-1",
			"status": status,
			"delayCapture": true,
			"amount": { "total": 7300, "currency": "BRL", "fees": 0 },
			"installmentCount": 1,
			"fundingInstrument": {
				"method": "CREDIT_CARD",
				"creditCard": { "id": "CRC-1", "brand": "VISA", "first6": "401200", "last4": "1112" }
			},
			"escrows": [{ "id": "ECW-1", "status": "HOLD_PENDING", "amount": 7300 }],
			"events": [{ "type": "PAYMENT.CREATED", "createdAt": "2024-05-01T10:00:00.000-03" }],
			"receivers": [{ "type": "PRIMARY", "moipAccount": { "id": "MPA-1" } }],
			"createdAt": "2024-05-01T10:00:00.000-03",
			"updatedAt": "2024-05-01T10:00:00.000-03",
			"_links": {
				"self": { "href": "https://sandbox.moip.com.br/v2/payments/PAY-1" },
				"order": { "href": "https://sandbox.moip.com.br/v2/orders/ORD-1", "title": "ORD-1" }
			}
		})
	}

	fn facade(executor: &Arc<FakeExecutor>) -> PaymentFacade<FakeExecutor> {
		PaymentFacade::new(
			executor.clone(),
			ReadAfterWritePolicy::default().with_polling(StdDuration::from_millis(1), 3),
		)
	}

	fn card_spec() -> PaymentSpec {
		PaymentSpec::new(FundingInstrument::credit_card(CreditCard {
			number: Some("4012001037141112".into()),
			expiration_month: Some("05".into()),
			expiration_year: Some("30".into()),
			cvc: Some("123".into()),
			..CreditCard::default()
		}))
		.with_installment_count(1)
		.with_statement_descriptor("minhaloja.com")
	}

	#[tokio::test]
	async fn create_links_payment_to_order() {
		let executor = Arc::new(FakeExecutor::new(Environment::Sandbox));

		executor.respond(201, payment_body("IN_ANALYSIS"));

		let order_id = OrderId::new("ORD-1").expect("Order id fixture should be valid.");
		let spec = card_spec().with_delay_capture(true).with_escrow("Held until delivery");
		let payment = facade(&executor).create(&order_id, &spec).await.expect("Payment should be created.");

		assert_eq!(payment.order_id(), Some(order_id));
		assert!(payment.delay_capture);
		assert_eq!(payment.escrows[0].id.as_str(), "ECW-1");
		assert_eq!(payment.events[0].kind, "PAYMENT.CREATED");

		let requests = executor.recorded();
		let request = &requests[0];
		let body = request.body.as_ref().expect("Create must carry a body.");

		assert_eq!(request.path, ["v2", "orders", "ORD-1", "payments"]);
		assert_eq!(request.idempotency_key, None);
		assert_eq!(body["delayCapture"], true);
		assert_eq!(body["escrow"]["description"], "Held until delivery");
		assert_eq!(body["fundingInstrument"]["creditCard"]["expirationMonth"], "05");
		assert!(body.get("idempotencyKey").is_none());
	}

	#[tokio::test]
	async fn lifecycle_transitions_hit_their_endpoints() {
		let executor = Arc::new(FakeExecutor::new(Environment::Sandbox));

		executor.respond(200, payment_body("AUTHORIZED")).respond(200, payment_body("CANCELLED"));

		let payments = facade(&executor);
		let captured =
			payments.pre_authorization_capture(&payment_id()).await.expect("Capture should succeed.");
		let cancelled =
			payments.pre_authorization_cancel(&payment_id()).await.expect("Cancel should succeed.");

		assert_eq!(captured.status, Status::AUTHORIZED);
		assert_eq!(cancelled.status, Status::CANCELLED);

		let requests = executor.recorded();

		assert_eq!(requests[0].path, ["v2", "payments", "PAY-1", "capture"]);
		assert_eq!(requests[1].path, ["v2", "payments", "PAY-1", "void"]);
		assert!(requests.iter().all(|request| request.method == Method::POST));
	}

	#[tokio::test]
	async fn authorize_is_sandbox_only() {
		let production = Arc::new(FakeExecutor::new(Environment::Production));
		let err = facade(&production)
			.authorize(&payment_id(), 7300)
			.await
			.expect_err("Production must refuse the simulator.");

		assert!(matches!(
			err,
			Error::Client(ClientError::SandboxOnly { operation: "payment_authorize" })
		));
		assert!(production.recorded().is_empty());

		let sandbox = Arc::new(FakeExecutor::new(Environment::Sandbox));

		sandbox.respond(200, JsonValue::Null);
		facade(&sandbox).authorize(&payment_id(), 7300).await.expect("Sandbox authorize should pass.");

		let requests = sandbox.recorded();
		let request = &requests[0];

		assert_eq!(request.path, ["simulador", "authorize"]);
		assert_eq!(
			request.query,
			[("payment_id".to_owned(), "PAY-1".to_owned()), ("amount".to_owned(), "7300".to_owned())]
		);
	}

	#[tokio::test]
	async fn poll_until_stops_on_target_or_budget() {
		let executor = Arc::new(FakeExecutor::new(Environment::Sandbox));

		executor
			.respond(200, payment_body("IN_ANALYSIS"))
			.respond(200, payment_body("AUTHORIZED"));

		let payments = facade(&executor);
		let payment = payments
			.poll_until(&payment_id(), &[Status::AUTHORIZED])
			.await
			.expect("Polling should succeed.");

		assert_eq!(payment.status, Status::AUTHORIZED);
		assert_eq!(executor.recorded().len(), 2);

		for _ in 0..3 {
			executor.respond(200, payment_body("WAITING"));
		}

		let last = payments
			.poll_until(&payment_id(), &[Status::SETTLED])
			.await
			.expect("Polling should return the last observation.");

		assert_eq!(last.status, Status::WAITING);
		assert_eq!(executor.recorded().len(), 5);
	}

	#[test]
	fn card_debug_redacts_sensitive_fields() {
		let rendered = format!("{:?}", card_spec());

		assert!(!rendered.contains("4012001037141112"));
		assert!(!rendered.contains("\"123\""));
		assert!(rendered.contains("<redacted>"));
	}
}
