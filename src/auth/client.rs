//! Login result delivered to completions.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ScopeSet, TokenSecret},
};

/// Outcome of a successful login attempt.
///
/// Without code exchange only [`authorization_code`](Self::authorization_code) is set; after
/// an exchange only [`access_token`](Self::access_token) is set and the remaining token
/// fields are read through it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
	/// Authorization code parsed from the callback URL.
	pub authorization_code: Option<String>,
	/// Token obtained by exchanging the authorization code.
	pub access_token: Option<AccessToken>,
}
impl Client {
	/// Result for flows that hand the authorization code back to the caller.
	pub fn with_authorization_code(code: impl Into<String>) -> Self {
		Self { authorization_code: Some(code.into()), access_token: None }
	}

	/// Result for flows that exchanged the code for a token.
	pub fn with_access_token(token: AccessToken) -> Self {
		Self { authorization_code: None, access_token: Some(token) }
	}

	/// Refresh token issued alongside the access token.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref()?.refresh_token.as_ref()
	}

	/// Token type reported by the token endpoint.
	pub fn token_type(&self) -> Option<&str> {
		self.access_token.as_ref().map(|token| token.token_type.as_str())
	}

	/// Access-token lifetime.
	pub fn expires_in(&self) -> Option<Duration> {
		self.access_token.as_ref()?.expires_in
	}

	/// Scopes granted to the access token.
	pub fn scope(&self) -> Option<&ScopeSet> {
		self.access_token.as_ref()?.scope.as_ref()
	}
}
