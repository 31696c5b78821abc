//! Lifecycle status tags.

// std
use std::borrow::Cow;
// self
use crate::_prelude::*;

/// Opaque, comparable lifecycle tag reported by the service.
///
/// Well-known values are exposed as constants; anything else is kept verbatim so newer
/// server states never fail deserialization.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Status(Cow<'static, str>);
impl Status {
	/// Order accepted, no payment yet.
	pub const CREATED: Self = Self::known("CREATED");
	/// Awaiting payment confirmation.
	pub const WAITING: Self = Self::known("WAITING");
	/// Under risk analysis.
	pub const IN_ANALYSIS: Self = Self::known("IN_ANALYSIS");
	/// Funds reserved, awaiting capture or cancellation.
	pub const PRE_AUTHORIZED: Self = Self::known("PRE_AUTHORIZED");
	/// Payment authorized.
	pub const AUTHORIZED: Self = Self::known("AUTHORIZED");
	/// Payment cancelled.
	pub const CANCELLED: Self = Self::known("CANCELLED");
	/// Payment refunded.
	pub const REFUNDED: Self = Self::known("REFUNDED");
	/// Payment charged back.
	pub const REVERSED: Self = Self::known("REVERSED");
	/// Funds available to the receiver.
	pub const SETTLED: Self = Self::known("SETTLED");
	/// Escrow awaiting the payment authorization.
	pub const HOLD_PENDING: Self = Self::known("HOLD_PENDING");
	/// Escrow holding funds.
	pub const HOLD: Self = Self::known("HOLD");
	/// Escrow released.
	pub const RELEASED: Self = Self::known("RELEASED");

	const fn known(value: &'static str) -> Self {
		Self(Cow::Borrowed(value))
	}

	/// Wraps an arbitrary status string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Cow::Owned(value.into()))
	}

	/// Returns the raw tag.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the tag is one of `candidates`.
	pub fn is_any_of(&self, candidates: &[Status]) -> bool {
		candidates.contains(self)
	}
}
impl PartialEq<str> for Status {
	fn eq(&self, other: &str) -> bool {
		self.as_str() == other
	}
}
impl PartialEq<&str> for Status {
	fn eq(&self, other: &&str) -> bool {
		self.as_str() == *other
	}
}
impl Debug for Status {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Status({})", self.0)
	}
}
impl Display for Status {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl Serialize for Status {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&self.0)
	}
}
impl<'de> Deserialize<'de> for Status {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Self::new)
	}
}
