//! Host-platform capabilities consumed by the login orchestrator.
//!
//! Each trait is the narrow contract the orchestrator needs from the embedding application:
//! static configuration plus an installed-app probe, a URL launcher, and an interactive web
//! authentication surface. Implementations are injected as `Arc<dyn Trait>` so tests can swap
//! in recording doubles.

// self
use crate::{_prelude::*, auth::UberApp};

/// Boxed future returned by platform capabilities.
pub type PlatformFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Static client configuration plus an installed-app probe.
pub trait ConfigurationProvider
where
	Self: Send + Sync,
{
	/// OAuth client identifier.
	fn client_id(&self) -> &str;

	/// Redirect URI registered for the client, unparsed.
	fn redirect_uri(&self) -> &str;

	/// Version string sent to the authorization server.
	fn sdk_version(&self) -> &str;

	/// Reports whether `app` is installed.
	///
	/// Returns `default_if_unregistered` when the host cannot query the app's scheme.
	fn is_installed(&self, app: UberApp, default_if_unregistered: bool) -> bool;
}

/// Opens URLs in whichever installed application claims them.
pub trait ApplicationLauncher
where
	Self: Send + Sync,
{
	/// Opens `url`, resolving to whether any application handled it.
	fn launch(&self, url: Url) -> PlatformFuture<'_, bool>;
}

/// Interactive web-authentication surface (system browser sheet, embedded web view).
pub trait BrowserSession
where
	Self: Send + Sync,
{
	/// Presents the session and resolves once the surface finishes.
	///
	/// Resolves to the callback URL the server redirected to, to [`Error::Cancelled`] when
	/// the user dismissed the surface, or to a surface-specific error.
	fn start(&self) -> PlatformFuture<'_, Result<Url>>;
}

/// Creates a [`BrowserSession`] for an authorization URL.
pub trait BrowserSessionFactory
where
	Self: Send + Sync,
{
	/// Builds, without starting, a session that loads `authorize_url` and completes on
	/// navigation to `callback_scheme`.
	fn create(&self, authorize_url: &Url, callback_scheme: &str) -> Arc<dyn BrowserSession>;
}
impl<F> BrowserSessionFactory for F
where
	F: Send + Sync + Fn(&Url, &str) -> Arc<dyn BrowserSession>,
{
	fn create(&self, authorize_url: &Url, callback_scheme: &str) -> Arc<dyn BrowserSession> {
		self(authorize_url, callback_scheme)
	}
}
