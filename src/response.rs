//! Callback URL validation and authorization-response parsing.

// self
use crate::{_prelude::*, auth::Client, error::OAuthError};

/// Validates and parses redirect callbacks.
///
/// The orchestrator only parses URLs that [`is_valid_response`](Self::is_valid_response)
/// accepted, so implementations may assume the scheme and host already match.
pub trait ResponseParser
where
	Self: Send + Sync,
{
	/// Returns true when `url` targets the scheme and host of `expected`.
	fn is_valid_response(&self, url: &Url, expected: &str) -> bool;

	/// Extracts the authorization code or the OAuth error carried by `url`.
	fn parse(&self, url: &Url) -> Result<Client>;
}

/// Default parser for `code`/`error` query callbacks.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorizationCodeResponseParser;
impl ResponseParser for AuthorizationCodeResponseParser {
	fn is_valid_response(&self, url: &Url, expected: &str) -> bool {
		let Ok(expected) = Url::parse(expected) else {
			return false;
		};

		match (scheme_and_host(url), scheme_and_host(&expected)) {
			(Some((scheme, host)), Some((expected_scheme, expected_host))) =>
				scheme.eq_ignore_ascii_case(expected_scheme) && host == expected_host,
			_ => false,
		}
	}

	fn parse(&self, url: &Url) -> Result<Client> {
		if url.query().is_none() {
			return Err(Error::InvalidResponse);
		}

		let mut code = None;
		let mut error = None;

		for (key, value) in url.query_pairs() {
			match key.as_ref() {
				"error" if error.is_none() => error = Some(value.into_owned()),
				"code" if code.is_none() => code = Some(value.into_owned()),
				_ => {},
			}
		}

		if let Some(error) = error {
			return Err(error.parse::<OAuthError>().map_or(Error::InvalidAuthCode, Error::OAuth));
		}

		match code {
			Some(code) if !code.is_empty() => Ok(Client::with_authorization_code(code)),
			_ => Err(Error::InvalidResponse),
		}
	}
}

/// Scheme and non-empty host of `url`.
pub(crate) fn scheme_and_host(url: &Url) -> Option<(&str, &str)> {
	let scheme = url.scheme();
	let host = url.host_str().filter(|host| !host.is_empty())?;

	if scheme.is_empty() { None } else { Some((scheme, host)) }
}
