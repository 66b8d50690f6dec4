//! Wire-level OAuth requests: the authorize URL plus the typed PAR and token exchanges.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	basic::BasicErrorResponse,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::{Deserializer, de::DeserializeOwned};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Prefill, Prompt, PromptOption, ScopeSet, UberApp},
	config::AuthEndpoints,
	error::{ConfigError, NetworkError},
	http::{HttpRequest, HttpResponse, NetworkProvider},
	pkce::PkcePair,
};

const SDK_VERSION_HEADER: &str = "x-uber-sdk-version";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parameters of one authorization URL.
#[derive(Clone, Debug)]
pub struct AuthorizeRequest<'a> {
	/// OAuth client identifier.
	pub client_id: &'a str,
	/// Redirect URI, already validated.
	pub redirect_uri: &'a str,
	/// Requested scopes.
	pub scopes: &'a ScopeSet,
	/// Prompt hints.
	pub prompt: Prompt,
	/// PKCE pair, present only when the code will be exchanged.
	pub pkce: Option<&'a PkcePair>,
	/// Request URI returned by a pushed authorization request.
	pub request_uri: Option<&'a str>,
	/// Companion app the URL is launched in, or `None` for the in-app browser.
	pub app: Option<UberApp>,
}
impl AuthorizeRequest<'_> {
	/// Returns a copy targeting `app` (or the in-app browser when `None`).
	pub fn for_app(&self, app: Option<UberApp>) -> Self {
		Self { app, ..self.clone() }
	}

	/// Builds the authorization URL.
	///
	/// Companion apps already hold a signed-in user, so the `login` hint is dropped from
	/// native URLs while `consent` is kept.
	pub fn url(&self, endpoints: &AuthEndpoints) -> Result<Url, ConfigError> {
		let mut url = endpoints.authorize(self.app)?;
		let prompt =
			if self.app.is_some() { self.prompt.without(PromptOption::Login) } else { self.prompt };
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", self.client_id);
		pairs.append_pair("redirect_uri", self.redirect_uri);

		if let Some(scope) = self.scopes.to_query_value() {
			pairs.append_pair("scope", &scope);
		}
		if let Some(prompt) = prompt.to_query_value() {
			pairs.append_pair("prompt", &prompt);
		}
		if let Some(pkce) = self.pkce {
			pairs.append_pair("code_challenge", pkce.challenge());
			pairs.append_pair("code_challenge_method", pkce.method().as_str());
		}
		if let Some(request_uri) = self.request_uri {
			pairs.append_pair("request_uri", request_uri);
		}

		drop(pairs);

		Ok(url)
	}
}

/// Typed request/response pair executed through a [`NetworkProvider`].
pub trait NetworkRequest
where
	Self: Send + Sync,
{
	/// JSON body shape returned on success.
	type Wire: DeserializeOwned + Into<Self::Response>;
	/// Value handed back to the caller.
	type Response;

	/// Endpoint label used in errors and spans.
	const ENDPOINT: &'static str;

	/// Absolute endpoint URL.
	fn url(&self, endpoints: &AuthEndpoints) -> Url;

	/// Form-encoded body parameters.
	fn form(&self) -> Vec<(&'static str, String)>;

	/// Builds the POST request.
	fn http_request(
		&self,
		endpoints: &AuthEndpoints,
		sdk_version: &str,
	) -> Result<HttpRequest, NetworkError> {
		let body = form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.form())
			.finish()
			.into_bytes();

		Ok(Request::builder()
			.method(Method::POST)
			.uri(self.url(endpoints).as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(ACCEPT, "application/json")
			.header(SDK_VERSION_HEADER, sdk_version)
			.body(body)?)
	}

	/// Decodes a response, mapping non-success statuses to [`NetworkError::Status`].
	fn decode(response: HttpResponse) -> Result<Self::Response, NetworkError> {
		let status = response.status();

		if !status.is_success() {
			let body = serde_json::from_slice::<BasicErrorResponse>(response.body()).ok();

			return Err(NetworkError::Status {
				endpoint: Self::ENDPOINT,
				status: status.as_u16(),
				oauth_error: body.as_ref().map(|b| b.error().as_ref().to_owned()),
				description: body.and_then(|b| b.error_description().cloned()),
			});
		}

		let mut de = serde_json::Deserializer::from_slice(response.body());
		let wire: Self::Wire = serde_path_to_error::deserialize(&mut de).map_err(|source| {
			NetworkError::Decode { endpoint: Self::ENDPOINT, source, status: status.as_u16() }
		})?;

		Ok(wire.into())
	}
}

/// Executes a typed request through `network`.
pub async fn execute<R>(
	network: &dyn NetworkProvider,
	endpoints: &AuthEndpoints,
	sdk_version: &str,
	request: &R,
) -> Result<R::Response, NetworkError>
where
	R: NetworkRequest,
{
	let http_request = request.http_request(endpoints, sdk_version)?;
	let response = network.send(R::ENDPOINT, http_request).await?;

	R::decode(response)
}

/// Pushed authorization request carrying prefill data.
#[derive(Clone, Debug)]
pub struct ParRequest {
	/// OAuth client identifier.
	pub client_id: String,
	/// User details to prefill.
	pub prefill: Prefill,
}
impl ParRequest {
	/// Base64 (standard alphabet) of the JSON-encoded prefill object.
	pub fn login_hint(&self) -> String {
		// Serializing a struct of optional strings cannot fail.
		let json = serde_json::to_vec(&self.prefill).unwrap_or_default();

		STANDARD.encode(json)
	}
}
impl NetworkRequest for ParRequest {
	type Response = Par;
	type Wire = Par;

	const ENDPOINT: &'static str = "par";

	fn url(&self, endpoints: &AuthEndpoints) -> Url {
		endpoints.par()
	}

	fn form(&self) -> Vec<(&'static str, String)> {
		vec![
			("client_id", self.client_id.clone()),
			("response_type", "code".into()),
			("login_hint", self.login_hint()),
		]
	}
}

/// Result of a pushed authorization request.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Par {
	/// Opaque reference to the pushed parameters.
	pub request_uri: Option<String>,
	/// Lifetime of `request_uri`.
	#[serde(deserialize_with = "seconds")]
	pub expires_in: Duration,
}

/// Authorization-code exchange bound to a PKCE verifier.
#[derive(Clone)]
pub struct TokenRequest {
	/// OAuth client identifier.
	pub client_id: String,
	/// Redirect URI used in the authorization request.
	pub redirect_uri: String,
	/// Code parsed from the callback.
	pub code: String,
	/// PKCE verifier generated for the attempt.
	pub code_verifier: String,
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequest")
			.field("client_id", &self.client_id)
			.field("redirect_uri", &self.redirect_uri)
			.field("code", &"<redacted>")
			.field("code_verifier", &"<redacted>")
			.finish()
	}
}
impl NetworkRequest for TokenRequest {
	type Response = AccessToken;
	type Wire = TokenResponse;

	const ENDPOINT: &'static str = "token";

	fn url(&self, endpoints: &AuthEndpoints) -> Url {
		endpoints.token()
	}

	fn form(&self) -> Vec<(&'static str, String)> {
		vec![
			("grant_type", "authorization_code".into()),
			("code", self.code.clone()),
			("code_verifier", self.code_verifier.clone()),
			("client_id", self.client_id.clone()),
			("redirect_uri", self.redirect_uri.clone()),
		]
	}
}

/// Token endpoint success body.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
	access_token: String,
	token_type: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default, deserialize_with = "optional_seconds")]
	expires_in: Option<Duration>,
	#[serde(default)]
	scope: Option<String>,
}
impl From<TokenResponse> for AccessToken {
	fn from(wire: TokenResponse) -> Self {
		let TokenResponse { access_token, token_type, refresh_token, expires_in, scope } = wire;
		let mut token = AccessToken::new(access_token, token_type);

		if let Some(refresh) = refresh_token {
			token = token.with_refresh_token(refresh);
		}
		if let Some(lifetime) = expires_in {
			token = token.with_expires_in(lifetime);
		}
		// Servers occasionally echo malformed scope strings; the token stays usable.
		if let Some(scope) = scope.and_then(|raw| ScopeSet::from_str(&raw).ok()) {
			token = token.with_scope(scope);
		}

		token
	}
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: Deserializer<'de>,
{
	i64::deserialize(deserializer).map(Duration::seconds)
}

fn optional_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(<Option<i64>>::deserialize(deserializer)?.map(Duration::seconds))
}
