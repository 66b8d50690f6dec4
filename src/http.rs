//! Transport contract for PAR and token-exchange requests.
//!
//! The orchestrator never talks to an HTTP stack directly. It builds typed requests (see
//! [`crate::oauth`]) into [`HttpRequest`] values and hands them to a [`NetworkProvider`],
//! which owns connection reuse, TLS, timeouts, and retries. [`ReqwestNetworkProvider`] is
//! the bundled implementation behind the `reqwest` feature.

pub use oauth2::{HttpRequest, HttpResponse};

// self
use crate::{_prelude::*, error::NetworkError};

/// Boxed future returned by [`NetworkProvider::send`].
pub type NetworkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, NetworkError>> + 'a + Send>>;

/// Executes HTTP requests on behalf of the login flow.
///
/// Implementations must return non-success responses as `Ok` so that the typed request
/// layer can decode OAuth error bodies; only transport failures map to `Err`.
pub trait NetworkProvider
where
	Self: Send + Sync,
{
	/// Sends `request`; `endpoint` labels the call (`par` or `token`) for error reporting.
	fn send(&self, endpoint: &'static str, request: HttpRequest) -> NetworkFuture<'_, HttpResponse>;
}

/// Thin wrapper around [`ReqwestClient`].
///
/// PAR and token endpoints answer directly, so the default client is built without
/// redirect following. Configure any custom [`ReqwestClient`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestNetworkProvider(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestNetworkProvider {
	/// Builds a provider with redirect following disabled.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestNetworkProvider {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl NetworkProvider for ReqwestNetworkProvider {
	fn send(&self, endpoint: &'static str, request: HttpRequest) -> NetworkFuture<'_, HttpResponse> {
		Box::pin(async move {
			let request = reqwest::Request::try_from(request)
				.map_err(|e| NetworkError::transport(endpoint, e))?;
			let response =
				self.0.execute(request).await.map_err(|e| NetworkError::transport(endpoint, e))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body =
				response.bytes().await.map_err(|e| NetworkError::transport(endpoint, e))?.to_vec();
			let mut converted = HttpResponse::new(body);

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}
