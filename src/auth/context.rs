//! Login contexts: where to authenticate, which provider to use, and optional prefill data.

// self
use crate::{
	_prelude::*,
	auth::{Prompt, ScopeSet},
};

/// Companion applications able to complete authorization on the user's behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UberApp {
	/// Rider app.
	Rides,
	/// Eats app.
	Eats,
	/// Driver app.
	Driver,
}
impl UberApp {
	/// Default probing order for native logins.
	pub const ALL: [UberApp; 3] = [UberApp::Rides, UberApp::Eats, UberApp::Driver];

	/// URL scheme the app registers for deeplinks.
	pub const fn deeplink_scheme(self) -> &'static str {
		match self {
			UberApp::Rides => "uber",
			UberApp::Eats => "ubereats",
			UberApp::Driver => "uberdriver",
		}
	}

	/// Subdomain whose universal links the app claims.
	pub const fn url_identifier(self) -> &'static str {
		match self {
			UberApp::Rides => "m",
			UberApp::Eats => "eats",
			UberApp::Driver => "drivers",
		}
	}
}
impl Display for UberApp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			UberApp::Rides => "rides",
			UberApp::Eats => "eats",
			UberApp::Driver => "driver",
		})
	}
}

/// Routing strategy for a login attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthDestination {
	/// Authenticate inside an in-process browser session.
	#[default]
	InApp,
	/// Hand off to the first installed app in `app_priority`, falling back to
	/// [`InApp`](Self::InApp) when none is installed or none accepts the launch.
	Native {
		/// Apps probed strictly in this order.
		app_priority: Vec<UberApp>,
	},
}
impl AuthDestination {
	/// Native destination probing every known app in default order.
	pub fn native() -> Self {
		Self::Native { app_priority: UberApp::ALL.to_vec() }
	}

	/// Stable label suitable for span or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			AuthDestination::InApp => "in_app",
			AuthDestination::Native { .. } => "native",
		}
	}
}

/// User details forwarded through a pushed authorization request to prefill sign-up forms.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
	/// Email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Phone number, serialized as `phone`.
	#[serde(rename = "phone", skip_serializing_if = "Option::is_none")]
	pub phone_number: Option<String>,
	/// Given name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
}

/// Auth provider selection plus its per-provider options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProviderKind {
	/// Authorization code grant with optional PKCE-bound code exchange.
	AuthorizationCode {
		/// Exchange the returned code for an access token before completing.
		should_exchange_auth_code: bool,
		/// Prompt hints forwarded to the authorization server.
		prompt: Prompt,
		/// Requested scopes.
		scopes: ScopeSet,
	},
}
impl AuthProviderKind {
	/// Authorization code provider that exchanges the code and sends no prompt.
	pub fn authorization_code() -> Self {
		Self::AuthorizationCode {
			should_exchange_auth_code: true,
			prompt: Prompt::empty(),
			scopes: ScopeSet::default(),
		}
	}
}
impl Default for AuthProviderKind {
	fn default() -> Self {
		Self::authorization_code()
	}
}

/// Immutable description of one login attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
	/// Where the user authenticates.
	pub destination: AuthDestination,
	/// Which provider executes the attempt.
	pub provider: AuthProviderKind,
	/// Optional prefill data; triggers a pushed authorization request when present.
	pub prefill: Option<Prefill>,
}
impl AuthContext {
	/// Creates a context for the provided destination and provider.
	pub fn new(destination: AuthDestination, provider: AuthProviderKind) -> Self {
		Self { destination, provider, prefill: None }
	}

	/// Attaches prefill data.
	pub fn with_prefill(mut self, prefill: Prefill) -> Self {
		self.prefill = Some(prefill);

		self
	}
}
