//! Client-side OAuth 2.0 authorization code + PKCE engine: companion-app handoff via universal
//! links, in-app browser sessions, pushed authorization requests for prefill, and callback
//! parsing behind injectable platform capabilities.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod pkce;
pub mod platform;
pub mod response;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and recording test doubles for every capability trait; enabled
	//! via `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		auth::{Client, UberApp},
		config::AuthEndpoints,
		error::NetworkError,
		flows::{AuthServices, Completion},
		http::{HttpRequest, HttpResponse, NetworkFuture, NetworkProvider},
		platform::{
			ApplicationLauncher, BrowserSession, BrowserSessionFactory, ConfigurationProvider,
			PlatformFuture,
		},
	};
	#[cfg(feature = "reqwest")] use crate::http::ReqwestNetworkProvider;

	/// Configuration double that records every installed-app probe.
	#[derive(Debug)]
	pub struct MockConfiguration {
		/// Client identifier returned to the provider.
		pub client_id: String,
		/// Redirect URI returned to the provider.
		pub redirect_uri: String,
		/// Version string returned to the provider.
		pub sdk_version: String,
		installed: HashMap<UberApp, bool>,
		probes: Mutex<Vec<UberApp>>,
	}
	impl MockConfiguration {
		/// Creates a configuration where no app is registered.
		pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
			Self {
				client_id: client_id.into(),
				redirect_uri: redirect_uri.into(),
				sdk_version: "test".into(),
				installed: HashMap::new(),
				probes: Mutex::new(Vec::new()),
			}
		}

		/// Records the installed answer for `app`.
		pub fn with_installed(mut self, app: UberApp, installed: bool) -> Self {
			self.installed.insert(app, installed);

			self
		}

		/// Apps probed so far, in call order.
		pub fn probes(&self) -> Vec<UberApp> {
			self.probes.lock().clone()
		}
	}
	impl ConfigurationProvider for MockConfiguration {
		fn client_id(&self) -> &str {
			&self.client_id
		}

		fn redirect_uri(&self) -> &str {
			&self.redirect_uri
		}

		fn sdk_version(&self) -> &str {
			&self.sdk_version
		}

		fn is_installed(&self, app: UberApp, default_if_unregistered: bool) -> bool {
			self.probes.lock().push(app);

			self.installed.get(&app).copied().unwrap_or(default_if_unregistered)
		}
	}

	/// Launcher double answering every launch with a fixed result.
	#[derive(Debug, Default)]
	pub struct MockLauncher {
		handled: bool,
		launched: Mutex<Vec<Url>>,
	}
	impl MockLauncher {
		/// Creates a launcher reporting `handled` for every URL.
		pub fn new(handled: bool) -> Self {
			Self { handled, launched: Mutex::new(Vec::new()) }
		}

		/// URLs launched so far.
		pub fn launched(&self) -> Vec<Url> {
			self.launched.lock().clone()
		}
	}
	impl ApplicationLauncher for MockLauncher {
		fn launch(&self, url: Url) -> PlatformFuture<'_, bool> {
			self.launched.lock().push(url);

			let handled = self.handled;

			Box::pin(async move { handled })
		}
	}

	/// Request observed by [`MockNetwork`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// Endpoint label.
		pub endpoint: &'static str,
		/// Target URL.
		pub uri: String,
		/// Value of the SDK version header.
		pub sdk_version: Option<String>,
		/// Decoded form parameters.
		pub form: HashMap<String, String>,
	}

	/// Network double replaying queued responses per endpoint label.
	#[derive(Debug, Default)]
	pub struct MockNetwork {
		responses: Mutex<HashMap<&'static str, VecDeque<(u16, String)>>>,
		requests: Mutex<Vec<RecordedRequest>>,
	}
	impl MockNetwork {
		/// Queues a response for `endpoint` (`par` or `token`).
		pub fn respond(self, endpoint: &'static str, status: u16, body: impl Into<String>) -> Self {
			self.responses.lock().entry(endpoint).or_default().push_back((status, body.into()));

			self
		}

		/// Requests sent so far.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.requests.lock().clone()
		}

		/// Requests sent to `endpoint` so far.
		pub fn requests_to(&self, endpoint: &str) -> Vec<RecordedRequest> {
			self.requests().into_iter().filter(|request| request.endpoint == endpoint).collect()
		}
	}
	impl NetworkProvider for MockNetwork {
		fn send(
			&self,
			endpoint: &'static str,
			request: HttpRequest,
		) -> NetworkFuture<'_, HttpResponse> {
			self.requests.lock().push(RecordedRequest {
				endpoint,
				uri: request.uri().to_string(),
				sdk_version: request
					.headers()
					.get("x-uber-sdk-version")
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned),
				form: url::form_urlencoded::parse(request.body()).into_owned().collect(),
			});

			let queued = self.responses.lock().get_mut(endpoint).and_then(VecDeque::pop_front);

			Box::pin(async move {
				let (status, body) = queued.ok_or_else(|| {
					NetworkError::transport(endpoint, std::io::Error::other("no queued response"))
				})?;
				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() = oauth2::http::StatusCode::from_u16(status)
					.map_err(|e| NetworkError::transport(endpoint, e))?;

				Ok(response)
			})
		}
	}

	/// Scripted result of a [`MockBrowserSession`].
	#[derive(Clone, Debug)]
	pub enum SessionOutcome {
		/// Resolves with the provided callback URL.
		Callback(Url),
		/// Resolves with [`Error::Cancelled`].
		Cancelled,
	}

	/// Browser-session double resolving with a scripted outcome.
	#[derive(Debug)]
	pub struct MockBrowserSession {
		outcome: SessionOutcome,
		starts: Mutex<usize>,
	}
	impl MockBrowserSession {
		/// Number of times the session was started.
		pub fn starts(&self) -> usize {
			*self.starts.lock()
		}
	}
	impl BrowserSession for MockBrowserSession {
		fn start(&self) -> PlatformFuture<'_, Result<Url>> {
			*self.starts.lock() += 1;

			let outcome = self.outcome.clone();

			Box::pin(async move {
				match outcome {
					SessionOutcome::Callback(url) => Ok(url),
					SessionOutcome::Cancelled => Err(Error::Cancelled),
				}
			})
		}
	}

	/// Factory double recording every session it creates.
	#[derive(Debug)]
	pub struct MockBrowserSessionFactory {
		outcome: SessionOutcome,
		created: Mutex<Vec<(Url, String, Arc<MockBrowserSession>)>>,
	}
	impl MockBrowserSessionFactory {
		/// Creates a factory whose sessions resolve with `outcome`.
		pub fn new(outcome: SessionOutcome) -> Self {
			Self { outcome, created: Mutex::new(Vec::new()) }
		}

		/// Sessions created so far as `(authorize_url, callback_scheme)` pairs.
		pub fn created(&self) -> Vec<(Url, String)> {
			self.created.lock().iter().map(|(url, scheme, _)| (url.clone(), scheme.clone())).collect()
		}

		/// Total starts across every created session.
		pub fn starts(&self) -> usize {
			self.created.lock().iter().map(|(_, _, session)| session.starts()).sum()
		}
	}
	impl BrowserSessionFactory for MockBrowserSessionFactory {
		fn create(&self, authorize_url: &Url, callback_scheme: &str) -> Arc<dyn BrowserSession> {
			let session = Arc::new(MockBrowserSession {
				outcome: self.outcome.clone(),
				starts: Mutex::new(0),
			});

			self.created.lock().push((
				authorize_url.clone(),
				callback_scheme.to_owned(),
				session.clone(),
			));

			session
		}
	}

	/// Receives completion results for assertions.
	#[derive(Clone, Debug, Default)]
	pub struct CompletionProbe(Arc<Mutex<Vec<Result<Client>>>>);
	impl CompletionProbe {
		/// Returns a completion that records into this probe.
		pub fn completion(&self) -> Completion {
			let results = self.0.clone();

			Box::new(move |result| results.lock().push(result))
		}

		/// Number of recorded invocations.
		pub fn count(&self) -> usize {
			self.0.lock().len()
		}

		/// Removes and returns the single recorded result.
		pub fn take_single(&self) -> Result<Client> {
			let mut results = self.0.lock();

			assert_eq!(results.len(), 1, "Completion must fire exactly once.");

			results.remove(0)
		}
	}

	/// Doubles wired into an [`AuthServices`] bundle.
	#[derive(Clone, Debug)]
	pub struct TestHarness {
		/// Configuration double.
		pub configuration: Arc<MockConfiguration>,
		/// Launcher double.
		pub launcher: Arc<MockLauncher>,
		/// Network double.
		pub network: Arc<MockNetwork>,
		/// Browser-session factory double.
		pub sessions: Arc<MockBrowserSessionFactory>,
	}
	impl TestHarness {
		/// Wraps the doubles.
		pub fn new(
			configuration: MockConfiguration,
			launcher: MockLauncher,
			network: MockNetwork,
			sessions: MockBrowserSessionFactory,
		) -> Self {
			Self {
				configuration: Arc::new(configuration),
				launcher: Arc::new(launcher),
				network: Arc::new(network),
				sessions: Arc::new(sessions),
			}
		}

		/// Bundles the doubles into services with default endpoints.
		pub fn services(&self) -> AuthServices {
			AuthServices::new(
				self.configuration.clone(),
				self.launcher.clone(),
				self.network.clone(),
				self.sessions.clone(),
			)
			.with_endpoints(AuthEndpoints::default())
		}
	}

	/// Builds a reqwest provider that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_provider() -> ReqwestNetworkProvider {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestNetworkProvider::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
