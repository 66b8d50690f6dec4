//! Login orchestration: the collaborator bundle, the provider contract, and the
//! authorization-code provider that drives each attempt.

pub mod auth_code;

mod common;

pub use auth_code::*;

// self
use crate::{
	_prelude::*,
	auth::{AuthDestination, Client, Prefill},
	config::{AuthConfig, AuthEndpoints},
	http::NetworkProvider,
	platform::{ApplicationLauncher, BrowserSessionFactory, ConfigurationProvider},
	response::{AuthorizationCodeResponseParser, ResponseParser},
};

/// Callback receiving the terminal outcome of a login attempt; invoked exactly once.
pub type Completion = Box<dyn FnOnce(Result<Client>) + Send>;

/// Boxed future returned by [`AuthProviding`] entry points.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Contract shared by login providers selected through the dispatcher.
pub trait AuthProviding
where
	Self: Send + Sync,
{
	/// Runs one login attempt, delivering its outcome through `completion`.
	///
	/// The returned future resolves once the attempt has been routed (app launched or browser
	/// session finished); the completion may fire later, from [`handle`](Self::handle).
	fn execute(
		&self,
		destination: AuthDestination,
		prefill: Option<Prefill>,
		completion: Completion,
	) -> AuthFuture<'_, ()>;

	/// Offers a redirect callback to the in-flight attempt, resolving to whether it was consumed.
	fn handle<'a>(&'a self, response: &'a Url) -> AuthFuture<'a, bool>;

	/// Returns true while an attempt has not reached a terminal outcome.
	fn is_in_flight(&self) -> bool;
}

/// Collaborators injected into every provider.
#[derive(Clone)]
pub struct AuthServices {
	/// Client configuration and installed-app probe.
	pub configuration: Arc<dyn ConfigurationProvider>,
	/// Authorization-server endpoints.
	pub endpoints: AuthEndpoints,
	/// Opens universal links in companion apps.
	pub launcher: Arc<dyn ApplicationLauncher>,
	/// Executes PAR and token requests.
	pub network: Arc<dyn NetworkProvider>,
	/// Creates in-app browser sessions.
	pub sessions: Arc<dyn BrowserSessionFactory>,
	/// Validates and parses redirect callbacks.
	pub parser: Arc<dyn ResponseParser>,
}
impl AuthServices {
	/// Bundles the capabilities with default endpoints and the standard callback parser.
	pub fn new(
		configuration: Arc<dyn ConfigurationProvider>,
		launcher: Arc<dyn ApplicationLauncher>,
		network: Arc<dyn NetworkProvider>,
		sessions: Arc<dyn BrowserSessionFactory>,
	) -> Self {
		Self {
			configuration,
			endpoints: AuthEndpoints::default(),
			launcher,
			network,
			sessions,
			parser: Arc::new(AuthorizationCodeResponseParser),
		}
	}

	/// Uses `config` as the configuration provider, taking its endpoints along.
	pub fn from_config(
		config: AuthConfig,
		launcher: Arc<dyn ApplicationLauncher>,
		network: Arc<dyn NetworkProvider>,
		sessions: Arc<dyn BrowserSessionFactory>,
	) -> Self {
		let endpoints = config.endpoints.clone();

		Self::new(Arc::new(config), launcher, network, sessions).with_endpoints(endpoints)
	}

	/// Overrides the endpoints.
	pub fn with_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Replaces the callback parser.
	pub fn with_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
		self.parser = parser;

		self
	}
}
impl Debug for AuthServices {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthServices")
			.field("client_id", &self.configuration.client_id())
			.field("redirect_uri", &self.configuration.redirect_uri())
			.field("endpoints", &self.endpoints)
			.finish_non_exhaustive()
	}
}
