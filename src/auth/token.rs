//! Access tokens issued by the token endpoint, with secrets kept out of logs.

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Token material returned by a successful authorization code exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Bearer credential presented to resource servers.
	pub token_string: TokenSecret,
	/// Token type reported by the server (usually `Bearer`).
	pub token_type: String,
	/// Refresh credential, when the server issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime relative to the moment the token was issued.
	pub expires_in: Option<Duration>,
	/// Scopes granted to this token, when the server echoed them.
	pub scope: Option<ScopeSet>,
}
impl AccessToken {
	/// Creates a token with only the mandatory fields populated.
	pub fn new(token_string: impl Into<String>, token_type: impl Into<String>) -> Self {
		Self {
			token_string: TokenSecret::new(token_string),
			token_type: token_type.into(),
			refresh_token: None,
			expires_in: None,
			scope: None,
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Attaches the relative lifetime.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_in = Some(expires_in);

		self
	}

	/// Attaches the granted scopes.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = Some(scope);

		self
	}

	/// Absolute expiry given the instant the token was received.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires_in.map(|lifetime| issued_at + lifetime)
	}
}
