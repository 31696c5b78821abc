//! Value types shared by several resources.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::_prelude::*;

/// Monetary amount in the currency's minor unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
	/// Total in cents.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total: Option<i64>,
	/// ISO 4217 currency code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub currency: Option<String>,
	/// Other amount fields (`subtotals`, `fees`, `liquid`, ...), kept verbatim.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}

/// Hypermedia links keyed by relation (`self`, `order`, `checkout`, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(pub BTreeMap<String, JsonValue>);
impl Links {
	/// Returns the `href` of `relation`.
	pub fn href(&self, relation: &str) -> Option<&str> {
		self.field(relation, "href")
	}

	/// Returns the `title` of `relation`; for parent links this is the parent identifier.
	pub fn title(&self, relation: &str) -> Option<&str> {
		self.field(relation, "title")
	}

	fn field(&self, relation: &str, field: &str) -> Option<&str> {
		self.0.get(relation)?.get(field)?.as_str()
	}
}

/// Server timestamp kept exactly as received.
///
/// The service emits offsets without minutes (`2017-06-21T15:11:51.000-03`), which is not
/// strict RFC 3339; [`Timestamp::to_offset_date_time`] normalizes that form before parsing.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);
impl Timestamp {
	/// Wraps a raw timestamp string.
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// Returns the raw value.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Best-effort conversion into an [`OffsetDateTime`].
	pub fn to_offset_date_time(&self) -> Option<OffsetDateTime> {
		if let Ok(parsed) = OffsetDateTime::parse(&self.0, &Rfc3339) {
			return Some(parsed);
		}

		let bytes = self.0.as_bytes();
		let hour_only_offset = bytes.len() > 3
			&& matches!(bytes[bytes.len() - 3], b'+' | b'-')
			&& bytes[bytes.len() - 2..].iter().all(u8::is_ascii_digit);

		if hour_only_offset {
			return OffsetDateTime::parse(&format!("{}:00", self.0), &Rfc3339).ok();
		}

		None
	}
}
impl Debug for Timestamp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Timestamp({})", self.0)
	}
}
impl Display for Timestamp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn links_expose_href_and_title() {
		let links: Links = serde_json::from_value(serde_json::json!({
			"self": { "href": "https://sandbox.moip.com.br/v2/payments/PAY-1" },
			"order": { "href": "https://sandbox.moip.com.br/v2/orders/ORD-1", "title": "ORD-1" }
		}))
		.expect("Links should deserialize.");

		assert_eq!(links.title("order"), Some("ORD-1"));
		assert_eq!(links.href("self"), Some("https://sandbox.moip.com.br/v2/payments/PAY-1"));
		assert_eq!(links.title("self"), None);
		assert_eq!(links.href("checkout"), None);
	}

	#[test]
	fn timestamps_accept_hour_only_offsets() {
		let strict = Timestamp::new("2017-06-21T15:11:51-03:00");
		let short = Timestamp::new("2017-06-21T15:11:51.000-03");
		let expected = macros::datetime!(2017-06-21 15:11:51 -03:00);

		assert_eq!(strict.to_offset_date_time(), Some(expected));
		assert_eq!(short.to_offset_date_time(), Some(expected));
		assert_eq!(short.as_str(), "2017-06-21T15:11:51.000-03");
		assert_eq!(Timestamp::new("yesterday").to_offset_date_time(), None);
	}
}
