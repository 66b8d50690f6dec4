//! Authorization Code provider with optional PKCE-bound code exchange.
//!
//! [`AuthorizationCodeAuthProvider::execute`] validates the configuration, pushes prefill data
//! when present, builds the authorize URL, and routes it: native destinations probe the app
//! priority list in order and launch the first installed app's universal link, falling back
//! to an in-app browser session when nothing is installed or the launch is declined. The
//! redirect comes back through [`AuthorizationCodeAuthProvider::handle`], either from the
//! host (native) or from the finished browser session (in-app).
//!
//! Only one attempt may be in flight per provider. A second `execute` fails immediately with
//! [`Error::ExistingAuthSession`], and every terminal outcome empties the slot before the
//! completion runs.

// self
use crate::{
	_prelude::*,
	auth::{AuthDestination, AuthProviderKind, Client, Prefill, Prompt, ScopeSet, UberApp},
	flows::{AuthFuture, AuthProviding, AuthServices, Completion, common::AttemptSlot},
	oauth::{self, AuthorizeRequest, Par, ParRequest, TokenRequest},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	pkce::PkcePair,
	response::scheme_and_host,
};

/// Orchestrates authorization-code logins.
pub struct AuthorizationCodeAuthProvider {
	services: AuthServices,
	should_exchange_auth_code: bool,
	prompt: Prompt,
	scopes: ScopeSet,
	slot: AttemptSlot,
}
impl AuthorizationCodeAuthProvider {
	/// Creates a provider that exchanges the code, sends no prompt, and requests no scopes.
	pub fn new(services: AuthServices) -> Self {
		Self {
			services,
			should_exchange_auth_code: true,
			prompt: Prompt::empty(),
			scopes: ScopeSet::default(),
			slot: AttemptSlot::default(),
		}
	}

	/// Creates a provider configured by `kind`.
	pub fn from_kind(services: AuthServices, kind: &AuthProviderKind) -> Self {
		match kind {
			AuthProviderKind::AuthorizationCode { should_exchange_auth_code, prompt, scopes } =>
				Self::new(services)
					.with_code_exchange(*should_exchange_auth_code)
					.with_prompt(*prompt)
					.with_scopes(scopes.clone()),
		}
	}

	/// Toggles the token exchange; without it the completion receives the raw code.
	pub fn with_code_exchange(mut self, enabled: bool) -> Self {
		self.should_exchange_auth_code = enabled;

		self
	}

	/// Sets the prompt hints.
	pub fn with_prompt(mut self, prompt: Prompt) -> Self {
		self.prompt = prompt;

		self
	}

	/// Sets the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Collaborators used by this provider.
	pub fn services(&self) -> &AuthServices {
		&self.services
	}

	/// Returns true while an attempt has not reached a terminal outcome.
	pub fn is_in_flight(&self) -> bool {
		self.slot.stage().is_some()
	}

	/// Runs one login attempt; `completion` fires exactly once with its outcome.
	pub async fn execute(
		&self,
		destination: AuthDestination,
		prefill: Option<Prefill>,
		completion: Completion,
	) {
		const KIND: FlowKind = FlowKind::Login;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let id = match self.slot.claim(completion) {
			Ok(id) => id,
			Err(completion) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				completion(Err(Error::ExistingAuthSession));

				return;
			},
		};
		let span = FlowSpan::new(KIND, destination.as_str()).with_attempt(id);

		if let Err(e) = span.instrument(self.run(id, destination, prefill)).await {
			self.finish(id, Err(e));
		}
	}

	/// Offers a redirect callback to the in-flight attempt.
	///
	/// Returns `false` without touching the attempt when `response` does not target the
	/// configured redirect URI or no attempt is waiting for a callback. Otherwise the
	/// callback is consumed, the attempt completes (after the token exchange when enabled),
	/// and `true` is returned even when the callback carried an error.
	pub async fn handle(&self, response: &Url) -> bool {
		let span = FlowSpan::new(FlowKind::Callback, "handle");

		span.instrument(async move {
			let expected = self.services.configuration.redirect_uri();

			if !self.services.parser.is_valid_response(response, expected) {
				return false;
			}

			let Some((id, pkce)) = self.slot.begin_callback() else {
				return false;
			};

			self.complete_callback(id, pkce, response).await;

			true
		})
		.await
	}

	async fn run(
		&self,
		id: u64,
		destination: AuthDestination,
		prefill: Option<Prefill>,
	) -> Result<()> {
		let (client_id, redirect) = self.validated_request()?;
		let pkce = self.should_exchange_auth_code.then(PkcePair::generate);
		let par = match prefill {
			Some(prefill) => Some(self.push_authorization(client_id, prefill).await?),
			None => None,
		};
		let request = AuthorizeRequest {
			client_id,
			redirect_uri: self.services.configuration.redirect_uri(),
			scopes: &self.scopes,
			prompt: self.prompt,
			pkce: pkce.as_ref(),
			request_uri: par.as_ref().and_then(|par| par.request_uri.as_deref()),
			app: None,
		};
		let in_app_url = request.url(&self.services.endpoints)?;
		let native_url = match &destination {
			AuthDestination::Native { app_priority } => match self.first_installed(app_priority) {
				Some(app) => Some(request.for_app(Some(app)).url(&self.services.endpoints)?),
				None => None,
			},
			AuthDestination::InApp => None,
		};

		if !self.slot.arm(id, pkce) {
			return Ok(());
		}

		let launched = match native_url {
			Some(url) => self.services.launcher.launch(url).await,
			None => false,
		};

		if launched {
			return Ok(());
		}

		self.start_session(id, in_app_url, redirect.scheme()).await;

		Ok(())
	}

	fn validated_request(&self) -> Result<(&str, Url)> {
		let configuration = &self.services.configuration;
		let client_id = configuration.client_id();

		if client_id.trim().is_empty() {
			return Err(Error::invalid_request("client id is empty"));
		}

		let redirect_uri = configuration.redirect_uri();

		if redirect_uri.trim().is_empty() {
			return Err(Error::invalid_request("redirect URI is empty"));
		}

		let redirect = Url::parse(redirect_uri)
			.map_err(|_| Error::invalid_request("redirect URI is malformed"))?;

		if scheme_and_host(&redirect).is_none() {
			return Err(Error::invalid_request("redirect URI lacks a scheme or host"));
		}

		Ok((client_id, redirect))
	}

	async fn push_authorization(&self, client_id: &str, prefill: Prefill) -> Result<Par> {
		const KIND: FlowKind = FlowKind::PushedAuthorization;

		let request = ParRequest { client_id: client_id.to_owned(), prefill };
		let span = FlowSpan::new(KIND, "push_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(oauth::execute(
				self.services.network.as_ref(),
				&self.services.endpoints,
				self.services.configuration.sdk_version(),
				&request,
			))
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		Ok(result?)
	}

	fn first_installed(&self, priority: &[UberApp]) -> Option<UberApp> {
		priority.iter().copied().find(|app| self.services.configuration.is_installed(*app, true))
	}

	// Sessions resolve independently of host callbacks, so everything here is scoped to `id`
	// and leaves the slot alone once that attempt has moved past waiting for its callback.
	async fn start_session(&self, id: u64, url: Url, callback_scheme: &str) {
		if !self.slot.is_awaiting(id) {
			return;
		}

		let session = self.services.sessions.create(&url, callback_scheme);
		let callback = match session.start().await {
			Ok(callback) => callback,
			Err(e) => {
				self.abandon(id, e);

				return;
			},
		};

		drop(session);

		let expected = self.services.configuration.redirect_uri();

		// The surface closed on a URL other than the redirect.
		if !self.services.parser.is_valid_response(&callback, expected) {
			self.abandon(id, Error::InvalidResponse);

			return;
		}

		let Some(pkce) = self.slot.begin_callback_for(id) else {
			return;
		};
		let span = FlowSpan::new(FlowKind::Callback, "session").with_attempt(id);

		span.instrument(self.complete_callback(id, pkce, &callback)).await;
	}

	async fn complete_callback(&self, id: u64, pkce: Option<PkcePair>, response: &Url) {
		const KIND: FlowKind = FlowKind::Callback;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = match (self.services.parser.parse(response), pkce) {
			(Ok(client), Some(pkce)) => self.exchange(client, pkce).await,
			(parsed, _) => parsed,
		};

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));
		self.finish(id, result);
	}

	async fn exchange(&self, client: Client, pkce: PkcePair) -> Result<Client> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		let code = client.authorization_code.ok_or(Error::InvalidResponse)?;
		let configuration = &self.services.configuration;
		let request = TokenRequest {
			client_id: configuration.client_id().to_owned(),
			redirect_uri: configuration.redirect_uri().to_owned(),
			code,
			code_verifier: pkce.verifier().to_owned(),
		};
		let span = FlowSpan::new(KIND, "exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(oauth::execute(
				self.services.network.as_ref(),
				&self.services.endpoints,
				configuration.sdk_version(),
				&request,
			))
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		Ok(Client::with_access_token(result?))
	}

	fn finish(&self, id: u64, result: Result<Client>) {
		let Some(attempt) = self.slot.take(id) else {
			return;
		};

		obs::record_flow_outcome(FlowKind::Login, FlowOutcome::of(&result));
		(attempt.into_completion())(result);
	}

	fn abandon(&self, id: u64, error: Error) {
		let Some(attempt) = self.slot.take_if_awaiting(id) else {
			return;
		};

		obs::record_flow_outcome(FlowKind::Login, FlowOutcome::Failure);
		(attempt.into_completion())(Err(error));
	}
}
impl AuthProviding for AuthorizationCodeAuthProvider {
	fn execute(
		&self,
		destination: AuthDestination,
		prefill: Option<Prefill>,
		completion: Completion,
	) -> AuthFuture<'_, ()> {
		Box::pin(Self::execute(self, destination, prefill, completion))
	}

	fn handle<'a>(&'a self, response: &'a Url) -> AuthFuture<'a, bool> {
		Box::pin(Self::handle(self, response))
	}

	fn is_in_flight(&self) -> bool {
		Self::is_in_flight(self)
	}
}
impl Debug for AuthorizationCodeAuthProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCodeAuthProvider")
			.field("services", &self.services)
			.field("should_exchange_auth_code", &self.should_exchange_auth_code)
			.field("prompt", &self.prompt)
			.field("scopes", &self.scopes)
			.field("slot", &self.slot)
			.finish()
	}
}
