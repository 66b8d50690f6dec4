//! Error taxonomy surfaced through login completions and builder APIs.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Name used by callers that mirror the SDK's public error type.
pub type UberAuthError = Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error delivered to login completions.
#[derive(Debug, ThisError)]
pub enum Error {
	/// `execute` was invoked while another attempt was still in flight.
	#[error("An authentication attempt is already in progress.")]
	ExistingAuthSession,
	/// Client identifier or redirect URI is missing or malformed.
	#[error("Authorization request is invalid: {reason}.")]
	InvalidRequest {
		/// Which precondition failed.
		reason: String,
	},
	/// Callback URL carried neither an authorization code nor an error.
	#[error("Callback URL did not contain a recognizable authorization response.")]
	InvalidResponse,
	/// Callback URL carried an `error` value outside the OAuth 2.0 registry.
	#[error("Callback URL carried an unrecognized authorization error.")]
	InvalidAuthCode,
	/// Authorization server rejected the request with a registered OAuth 2.0 error.
	#[error("Authorization server returned `{0}`.")]
	OAuth(OAuthError),
	/// User dismissed the browser session or no surface accepted the request.
	#[error("Authentication was cancelled.")]
	Cancelled,
	/// PAR or token exchange failed while talking to the authorization server.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Local configuration problem detected while building collaborators.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
		Self::InvalidRequest { reason: reason.into() }
	}
}
impl From<OAuthError> for Error {
	fn from(e: OAuthError) -> Self {
		Self::OAuth(e)
	}
}

/// Registered OAuth 2.0 authorization error codes (RFC 6749 §4.1.2.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthError {
	/// The request is missing a parameter or is otherwise malformed.
	InvalidRequest,
	/// The client is not authorized to use this grant.
	UnauthorizedClient,
	/// The resource owner or server denied the request.
	AccessDenied,
	/// The server does not support issuing codes with this method.
	UnsupportedResponseType,
	/// The requested scope is invalid, unknown, or malformed.
	InvalidScope,
	/// The server hit an unexpected condition.
	ServerError,
	/// The server is temporarily overloaded or under maintenance.
	TemporarilyUnavailable,
}
impl OAuthError {
	/// Every registered code in declaration order.
	pub const ALL: [OAuthError; 7] = [
		OAuthError::InvalidRequest,
		OAuthError::UnauthorizedClient,
		OAuthError::AccessDenied,
		OAuthError::UnsupportedResponseType,
		OAuthError::InvalidScope,
		OAuthError::ServerError,
		OAuthError::TemporarilyUnavailable,
	];

	/// Returns the wire value of the error code.
	pub const fn as_str(self) -> &'static str {
		match self {
			OAuthError::InvalidRequest => "invalid_request",
			OAuthError::UnauthorizedClient => "unauthorized_client",
			OAuthError::AccessDenied => "access_denied",
			OAuthError::UnsupportedResponseType => "unsupported_response_type",
			OAuthError::InvalidScope => "invalid_scope",
			OAuthError::ServerError => "server_error",
			OAuthError::TemporarilyUnavailable => "temporarily_unavailable",
		}
	}
}
impl Display for OAuthError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for OAuthError {
	type Err = UnknownOAuthError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|code| code.as_str() == s)
			.ok_or_else(|| UnknownOAuthError { value: s.to_owned() })
	}
}

/// Raised when an `error` value is not part of the OAuth 2.0 registry.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown OAuth error code: {value}.")]
pub struct UnknownOAuthError {
	/// The unrecognized value.
	pub value: String,
}

/// Configuration failures raised while building collaborators.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint base URL cannot be parsed or cannot carry a path.
	#[error("Endpoint URL is invalid: {url}.")]
	InvalidEndpoint {
		/// Offending URL text.
		url: String,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by PAR and token-exchange requests.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// HTTP request construction failed.
	#[error("Request could not be constructed.")]
	Request(#[from] oauth2::http::Error),
	/// Underlying transport failed (DNS, TCP, TLS, IO).
	#[error("Network error occurred while calling {endpoint}.")]
	Transport {
		/// Endpoint label (`par` or `token`).
		endpoint: &'static str,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Authorization server answered with a non-success status.
	#[error("{endpoint} endpoint returned HTTP {status}.")]
	Status {
		/// Endpoint label (`par` or `token`).
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Registered OAuth error code from the body, when present.
		oauth_error: Option<String>,
		/// `error_description` from the body, when present.
		description: Option<String>,
	},
	/// Authorization server answered with JSON that does not match the expected shape.
	#[error("{endpoint} endpoint returned malformed JSON.")]
	Decode {
		/// Endpoint label (`par` or `token`).
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
}
impl NetworkError {
	/// Wraps a transport-specific failure.
	pub fn transport(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Transport { endpoint, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn oauth_error_codes_parse_from_wire_values() {
		for code in OAuthError::ALL {
			assert_eq!(code.as_str().parse::<OAuthError>(), Ok(code));
		}

		let err = "some_unrecognized_value"
			.parse::<OAuthError>()
			.expect_err("Unknown codes must not parse.");

		assert_eq!(err.value, "some_unrecognized_value");
	}

	#[test]
	fn oauth_error_serializes_in_snake_case() {
		let payload = serde_json::to_string(&OAuthError::TemporarilyUnavailable)
			.expect("OAuthError should serialize to JSON.");

		assert_eq!(payload, "\"temporarily_unavailable\"");
	}

	#[test]
	fn network_error_converts_into_auth_error_with_source() {
		let err: Error = NetworkError::Status {
			endpoint: "token",
			status: 400,
			oauth_error: Some("invalid_grant".into()),
			description: None,
		}
		.into();

		assert!(matches!(err, Error::Network(NetworkError::Status { status: 400, .. })));
		assert_eq!(err.to_string(), "token endpoint returned HTTP 400.");
	}
}
