//! Client configuration and authorization-server endpoints.

// std
use std::collections::BTreeMap;
// self
use crate::{_prelude::*, auth::UberApp, error::ConfigError, platform::ConfigurationProvider};

const DEFAULT_BASE: &str = "https://auth.uber.com";
const DEFAULT_UNIVERSAL_LINK_DOMAIN: &str = "uber.com";
const AUTHORIZE_PATH: &str = "/oauth/v2/authorize";
const UNIVERSAL_AUTHORIZE_PATH: &str = "/oauth/v2/universal/authorize";
const PAR_PATH: &str = "/oauth/v2/par";
const TOKEN_PATH: &str = "/oauth/v2/token";

/// Authorization-server locations used by the login flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
	/// Base URL serving the authorize, PAR, and token endpoints.
	pub base: Url,
	/// Registrable domain whose `<app>.` subdomains serve universal authorize links.
	pub universal_link_domain: String,
}
impl AuthEndpoints {
	/// Points every endpoint at `base`, keeping the default universal-link domain.
	pub fn new(base: &str) -> Result<Self, ConfigError> {
		let base = Url::parse(base)
			.ok()
			.filter(|url| !url.cannot_be_a_base())
			.ok_or_else(|| ConfigError::InvalidEndpoint { url: base.to_owned() })?;

		Ok(Self { base, universal_link_domain: DEFAULT_UNIVERSAL_LINK_DOMAIN.into() })
	}

	/// Overrides the universal-link domain.
	pub fn with_universal_link_domain(mut self, domain: impl Into<String>) -> Self {
		self.universal_link_domain = domain.into();

		self
	}

	/// Authorization endpoint, either in-app or the universal link claimed by `app`.
	pub fn authorize(&self, app: Option<UberApp>) -> Result<Url, ConfigError> {
		match app {
			None => Ok(self.join(AUTHORIZE_PATH)),
			Some(app) => {
				let raw = format!(
					"https://{}.{}{UNIVERSAL_AUTHORIZE_PATH}",
					app.url_identifier(),
					self.universal_link_domain
				);

				Url::parse(&raw).map_err(|_| ConfigError::InvalidEndpoint { url: raw })
			},
		}
	}

	/// Pushed authorization request endpoint.
	pub fn par(&self) -> Url {
		self.join(PAR_PATH)
	}

	/// Token endpoint.
	pub fn token(&self) -> Url {
		self.join(TOKEN_PATH)
	}

	fn join(&self, path: &str) -> Url {
		let mut url = self.base.clone();
		let prefix = url.path().trim_end_matches('/').to_owned();

		url.set_path(&format!("{prefix}{path}"));

		url
	}
}
impl Default for AuthEndpoints {
	fn default() -> Self {
		Self {
			base: Url::parse(DEFAULT_BASE).expect("Default endpoint base must parse."),
			universal_link_domain: DEFAULT_UNIVERSAL_LINK_DOMAIN.into(),
		}
	}
}

/// Value-based [`ConfigurationProvider`].
///
/// The redirect URI is stored unparsed; each login attempt validates it so that a
/// misconfigured client surfaces as [`Error::InvalidRequest`] through the completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// Registered redirect URI.
	pub redirect_uri: String,
	/// Version string sent with network requests.
	#[serde(default = "default_sdk_version")]
	pub sdk_version: String,
	/// Installed-app answers known to the host; absent apps are unregistered.
	#[serde(default)]
	pub installed_apps: BTreeMap<UberApp, bool>,
	/// Authorization-server endpoints.
	#[serde(default)]
	pub endpoints: AuthEndpoints,
}
impl AuthConfig {
	/// Creates a configuration with default endpoints and no registered apps.
	pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
		Self::builder().client_id(client_id).redirect_uri(redirect_uri).build()
	}

	/// Starts an empty [`AuthConfigBuilder`].
	pub fn builder() -> AuthConfigBuilder {
		AuthConfigBuilder::default()
	}
}
impl ConfigurationProvider for AuthConfig {
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
		self.installed_apps.get(&app).copied().unwrap_or(default_if_unregistered)
	}
}

/// Builder for [`AuthConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct AuthConfigBuilder {
	/// OAuth client identifier; empty until set.
	pub client_id: String,
	/// Registered redirect URI; empty until set.
	pub redirect_uri: String,
	/// Overrides the crate version reported to the server.
	pub sdk_version: Option<String>,
	/// Installed-app answers known to the host.
	pub installed_apps: BTreeMap<UberApp, bool>,
	/// Overrides the default endpoints.
	pub endpoints: Option<AuthEndpoints>,
}
impl AuthConfigBuilder {
	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.redirect_uri = redirect_uri.into();

		self
	}

	/// Overrides the reported SDK version.
	pub fn sdk_version(mut self, version: impl Into<String>) -> Self {
		self.sdk_version = Some(version.into());

		self
	}

	/// Records whether `app` is installed.
	pub fn installed(mut self, app: UberApp, installed: bool) -> Self {
		self.installed_apps.insert(app, installed);

		self
	}

	/// Overrides the endpoints.
	pub fn endpoints(mut self, endpoints: AuthEndpoints) -> Self {
		self.endpoints = Some(endpoints);

		self
	}

	/// Produces the configuration.
	///
	/// Identifier and redirect URI are checked per login attempt rather than here.
	pub fn build(self) -> AuthConfig {
		AuthConfig {
			client_id: self.client_id,
			redirect_uri: self.redirect_uri,
			sdk_version: self.sdk_version.unwrap_or_else(default_sdk_version),
			installed_apps: self.installed_apps,
			endpoints: self.endpoints.unwrap_or_default(),
		}
	}
}

fn default_sdk_version() -> String {
	env!("CARGO_PKG_VERSION").into()
}
