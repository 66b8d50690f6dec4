//! Entry point tying login contexts, the current provider, and token storage together.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthContext},
	flows::{AuthProviding, AuthServices, AuthorizationCodeAuthProvider, Completion},
	store::{DEFAULT_ACCESS_TOKEN_IDENTIFIER, StoreError, TokenManager},
};

/// Routes logins to a provider chosen per context and saves exchanged tokens.
///
/// The provider built for a login stays current until the next login, so redirects handed to
/// [`handle`](Self::handle) reach the attempt that is waiting for them. A login issued while
/// that attempt is still in flight is sent to the same provider and therefore rejected with
/// [`Error::ExistingAuthSession`].
pub struct AuthDispatcher {
	services: AuthServices,
	tokens: Arc<dyn TokenManager>,
	current: Mutex<Option<Arc<dyn AuthProviding>>>,
}
impl AuthDispatcher {
	/// Creates a dispatcher with no provider selected.
	pub fn new(services: AuthServices, tokens: Arc<dyn TokenManager>) -> Self {
		Self { services, tokens, current: Mutex::new(None) }
	}

	/// Starts a login described by `context`.
	///
	/// Successful exchanges are saved under [`DEFAULT_ACCESS_TOKEN_IDENTIFIER`] before
	/// `completion` runs.
	pub async fn login(&self, context: AuthContext, completion: Completion) {
		let AuthContext { destination, provider, prefill } = context;
		let selected = {
			let mut current = self.current.lock();

			match current.as_ref().filter(|existing| existing.is_in_flight()) {
				Some(in_flight) => in_flight.clone(),
				None => {
					let fresh: Arc<dyn AuthProviding> = Arc::new(
						AuthorizationCodeAuthProvider::from_kind(self.services.clone(), &provider),
					);

					*current = Some(fresh.clone());

					fresh
				},
			}
		};
		let tokens = self.tokens.clone();
		let completion: Completion = Box::new(move |result| {
			if let Some(token) = result.as_ref().ok().and_then(|client| client.access_token.as_ref())
			{
				save_token(tokens.as_ref(), token.clone());
			}

			completion(result)
		});

		selected.execute(destination, prefill, completion).await;
	}

	/// Forwards a redirect callback to the current provider.
	pub async fn handle(&self, url: &Url) -> bool {
		let current = self.current.lock().clone();

		match current {
			Some(provider) => provider.handle(url).await,
			None => false,
		}
	}

	/// Returns true when a token is stored under the default identifier.
	pub fn is_logged_in(&self) -> Result<bool, StoreError> {
		Ok(self.tokens.get(DEFAULT_ACCESS_TOKEN_IDENTIFIER)?.is_some())
	}

	/// Token stored under the default identifier.
	pub fn access_token(&self) -> Result<Option<AccessToken>, StoreError> {
		self.tokens.get(DEFAULT_ACCESS_TOKEN_IDENTIFIER)
	}

	/// Deletes the stored token, reporting whether one existed.
	pub fn logout(&self) -> Result<bool, StoreError> {
		self.tokens.delete(DEFAULT_ACCESS_TOKEN_IDENTIFIER)
	}
}
impl Debug for AuthDispatcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthDispatcher")
			.field("services", &self.services)
			.field("provider_selected", &self.current.lock().is_some())
			.finish()
	}
}

fn save_token(tokens: &dyn TokenManager, token: AccessToken) {
	// The login itself succeeded; a storage failure must not turn it into an error.
	if let Err(e) = tokens.save(DEFAULT_ACCESS_TOKEN_IDENTIFIER, token) {
		#[cfg(feature = "tracing")]
		tracing::warn!(error = %e, "failed to save the exchanged access token");
		#[cfg(not(feature = "tracing"))]
		let _ = e;
	}
}
