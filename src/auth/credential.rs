//! Access credential issued by the authorization endpoint.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::AuthError};

/// Bearer value issued by the token endpoint.
///
/// Formatting never reveals the value; [`AccessToken::fingerprint`] gives logs a stable,
/// non-reversible handle so a rejected token can be told apart from its replacement.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);
impl AccessToken {
	const FINGERPRINT_BYTES: usize = 6;

	/// Raw value for the `Authorization` header. Never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// First bytes of the token's SHA-256 digest, URL-safe base64.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());

		URL_SAFE_NO_PAD.encode(&digest[..Self::FINGERPRINT_BYTES])
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AccessToken({})", self.fingerprint())
	}
}

/// Lifecycle status of a cached credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialStatus {
	/// Usable and outside the refresh window.
	Active,
	/// Still valid but inside the refresh window.
	Expiring,
	/// Past its expiry instant.
	Expired,
}

/// Access token, its type, and its validity window.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Access token; callers must avoid logging [`AccessToken::expose`].
	pub access_token: AccessToken,
	/// Token type reported by the authorization endpoint (e.g. `Bearer`, `OAuth`).
	pub token_type: String,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Instant the token stops being accepted.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	const DEFAULT_TOKEN_TYPE: &'static str = "Bearer";

	/// Builds a credential from an exchange response.
	pub fn issued(
		access_token: impl Into<String>,
		token_type: Option<&str>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Result<Self, AuthError> {
		if !expires_in.is_positive() {
			return Err(AuthError::ExpiresInOutOfRange);
		}

		let expires_at = issued_at.checked_add(expires_in).ok_or(AuthError::ExpiresInOutOfRange)?;
		let token_type = token_type
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(normalize_token_type)
			.unwrap_or_else(|| Self::DEFAULT_TOKEN_TYPE.to_owned());

		Ok(Self { access_token: AccessToken(access_token.into()), token_type, issued_at, expires_at })
	}

	/// Computes the status at `instant` using the provided refresh window.
	pub fn status_at(&self, instant: OffsetDateTime, refresh_window: Duration) -> CredentialStatus {
		if instant >= self.expires_at {
			return CredentialStatus::Expired;
		}
		if self.expires_at - instant <= refresh_window {
			return CredentialStatus::Expiring;
		}

		CredentialStatus::Active
	}

	/// Returns `true` when the credential can be attached without a refresh.
	pub fn is_usable_at(&self, instant: OffsetDateTime, refresh_window: Duration) -> bool {
		matches!(self.status_at(instant, refresh_window), CredentialStatus::Active)
	}

	/// Returns `true` once the expiry instant has passed.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Value for the `Authorization` header.
	pub fn authorization_header(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token)
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

fn normalize_token_type(raw: &str) -> String {
	if raw.eq_ignore_ascii_case("bearer") {
		"Bearer".into()
	} else if raw.eq_ignore_ascii_case("oauth") {
		"OAuth".into()
	} else {
		raw.to_owned()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn fixture(token_type: Option<&str>) -> Credential {
		Credential::issued(
			"token-1",
			token_type,
			macros::datetime!(2025-01-01 00:00 UTC),
			Duration::hours(1),
		)
		.expect("Credential fixture should build.")
	}

	#[test]
	fn status_transitions_follow_window() {
		let credential = fixture(None);
		let window = Duration::minutes(5);

		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 00:30 UTC), window),
			CredentialStatus::Active
		);
		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 00:56 UTC), window),
			CredentialStatus::Expiring
		);
		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 01:00 UTC), window),
			CredentialStatus::Expired
		);
		assert!(credential.is_expired_at(macros::datetime!(2025-01-01 01:00 UTC)));
		assert!(!credential.is_usable_at(macros::datetime!(2025-01-01 00:56 UTC), window));
	}

	#[test]
	fn token_type_normalizes_into_header() {
		assert_eq!(fixture(None).authorization_header(), "Bearer token-1");
		assert_eq!(fixture(Some("bearer")).authorization_header(), "Bearer token-1");
		assert_eq!(fixture(Some("OAUTH")).authorization_header(), "OAuth token-1");
		assert_eq!(fixture(Some("  ")).authorization_header(), "Bearer token-1");
	}

	#[test]
	fn non_positive_lifetimes_are_rejected() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);

		assert!(matches!(
			Credential::issued("t", None, issued, Duration::ZERO),
			Err(AuthError::ExpiresInOutOfRange)
		));
	}

	#[test]
	fn debug_shows_fingerprint_not_token() {
		let credential = fixture(None);
		let rendered = format!("{credential:?}");
		let fingerprint = credential.access_token.fingerprint();

		assert!(!rendered.contains("token-1"));
		assert!(rendered.contains(&format!("AccessToken({fingerprint})")));
		assert_eq!(fingerprint.len(), 8);
		assert_eq!(fingerprint, fixture(Some("bearer")).access_token.fingerprint());

		let other = Credential::issued(
			"token-2",
			None,
			macros::datetime!(2025-01-01 00:00 UTC),
			Duration::hours(1),
		)
		.expect("Credential fixture should build.");

		assert_ne!(other.access_token.fingerprint(), fingerprint);
	}
}
