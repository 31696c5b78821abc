//! Orders: the parent of every payment.

// self
use crate::{
	_prelude::*,
	config::ReadAfterWritePolicy,
	executor::{ApiRequest, Execute},
	obs::OperationKind,
	resource::{self, Amount, Links, OrderId, OwnId, Status, Timestamp},
};

/// Order creation request.
///
/// Fields the client does not model go into [`OrderSpec::extra`] and are sent verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSpec {
	/// Caller-supplied idempotency key; also sent as the `Idempotency-Key` header.
	pub own_id: OwnId,
	/// Currency and subtotals; the total is computed by the service.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount: Option<Amount>,
	/// Line items.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub items: Vec<OrderItem>,
	/// Buyer.
	pub customer: CustomerSpec,
	/// Additional fields forwarded as-is.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl OrderSpec {
	/// Creates a spec for `own_id` billed to `customer`.
	pub fn new(own_id: OwnId, customer: CustomerSpec) -> Self {
		Self { own_id, amount: None, items: Vec::new(), customer, extra: JsonMap::new() }
	}

	/// Sets the currency.
	pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
		self.amount.get_or_insert_with(Amount::default).currency = Some(currency.into());

		self
	}

	/// Appends a line item.
	pub fn with_item(mut self, item: OrderItem) -> Self {
		self.items.push(item);

		self
	}

	/// Adds a field that is forwarded verbatim.
	pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.extra.insert(key.into(), value);

		self
	}
}

/// Order line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
	/// Product name.
	pub product: String,
	/// Units ordered.
	pub quantity: u32,
	/// Free-form detail.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
	/// Unit price in cents.
	pub price: i64,
}
impl OrderItem {
	/// Creates an item without detail.
	pub fn new(product: impl Into<String>, quantity: u32, price: i64) -> Self {
		Self { product: product.into(), quantity, detail: None, price }
	}
}

/// Buyer attached to an order creation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSpec {
	/// Caller-supplied customer key.
	pub own_id: OwnId,
	/// Full name.
	pub fullname: String,
	/// Contact email.
	pub email: String,
	/// Tax document, phone, addresses, and anything else, forwarded as-is.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl CustomerSpec {
	/// Creates a customer with the mandatory fields.
	pub fn new(own_id: OwnId, fullname: impl Into<String>, email: impl Into<String>) -> Self {
		Self { own_id, fullname: fullname.into(), email: email.into(), extra: JsonMap::new() }
	}

	/// Adds a field that is forwarded verbatim.
	pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
		self.extra.insert(key.into(), value);

		self
	}
}

/// Buyer as reported by the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
	/// Server-assigned customer identifier.
	#[serde(default)]
	pub id: Option<String>,
	/// Caller-supplied customer key, verbatim as the service stores it.
	#[serde(default)]
	pub own_id: Option<String>,
	/// Full name.
	#[serde(default)]
	pub fullname: Option<String>,
	/// Contact email.
	#[serde(default)]
	pub email: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Order as reported by the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Server-assigned identifier.
	pub id: OrderId,
	/// Caller-supplied idempotency key echoed back verbatim; keys accepted by the service are
	/// never re-validated locally.
	#[serde(default)]
	pub own_id: Option<String>,
	/// Lifecycle status.
	#[serde(default)]
	pub status: Option<Status>,
	/// Amount breakdown.
	#[serde(default)]
	pub amount: Option<Amount>,
	/// Line items.
	#[serde(default)]
	pub items: Vec<OrderItem>,
	/// Buyer.
	#[serde(default)]
	pub customer: Option<Customer>,
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

/// Order endpoints.
pub struct OrderFacade<E = dyn Execute>
where
	E: ?Sized,
{
	executor: Arc<E>,
	read_after_write: ReadAfterWritePolicy,
}
impl<E> OrderFacade<E>
where
	E: ?Sized + Execute,
{
	/// Creates a facade over `executor`.
	pub fn new(executor: Arc<E>, read_after_write: ReadAfterWritePolicy) -> Self {
		Self { executor, read_after_write }
	}

	/// Creates an order (`POST v2/orders`).
	///
	/// A rejected spec fails with [`ClientError`](crate::error::ClientError); a reused `ownId`
	/// surfaces whatever the service answers for it.
	pub async fn create(&self, spec: &OrderSpec) -> Result<Order> {
		let request = ApiRequest::post(OperationKind::OrderCreate, ["v2", "orders"])
			.with_json(resource::to_body(spec)?)
			.with_idempotency_key(spec.own_id.as_str());
		let order = self.executor.execute(request).await?.into_json::<Order>()?;

		resource::settle(&self.read_after_write).await;

		Ok(order)
	}

	/// Reads an order (`GET v2/orders/{id}`).
	pub async fn get_one(&self, id: &OrderId) -> Result<Order> {
		let response = resource::read_with_retries(&*self.executor, &self.read_after_write, || {
			ApiRequest::get(OperationKind::OrderGet, ["v2", "orders", id.as_str()])
		})
		.await?;

		Ok(response.into_json()?)
	}
}
impl<E> Clone for OrderFacade<E>
where
	E: ?Sized,
{
	fn clone(&self) -> Self {
		Self { executor: Arc::clone(&self.executor), read_after_write: self.read_after_write.clone() }
	}
}
impl<E> Debug for OrderFacade<E>
where
	E: ?Sized,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OrderFacade").field("read_after_write", &self.read_after_write).finish()
	}
}
