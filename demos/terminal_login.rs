//! Runs an in-app login from a terminal: the authorize URL is printed, and the redirect URL the
//! browser lands on is pasted back in.
//!
//! ```sh
//! UBER_CLIENT_ID=... UBER_REDIRECT_URI=myapp://oauth cargo run --example terminal_login
//! ```

// std
use std::{
	env,
	io::{self, BufRead, Write},
	sync::{Arc, mpsc},
};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use uber_auth::{
	auth::{AuthContext, AuthDestination, AuthProviderKind, Prompt, PromptOption, ScopeSet},
	config::AuthConfig,
	dispatch::AuthDispatcher,
	error::Error,
	flows::AuthServices,
	http::ReqwestNetworkProvider,
	platform::{ApplicationLauncher, BrowserSession, PlatformFuture},
	store::MemoryTokenManager,
	url::Url,
};

/// No companion apps on a terminal; every launch is declined.
struct NoApps;
impl ApplicationLauncher for NoApps {
	fn launch(&self, _url: Url) -> PlatformFuture<'_, bool> {
		Box::pin(async { false })
	}
}

struct TerminalSession {
	authorize_url: Url,
}
impl BrowserSession for TerminalSession {
	fn start(&self) -> PlatformFuture<'_, uber_auth::error::Result<Url>> {
		let authorize_url = self.authorize_url.clone();

		Box::pin(async move {
			tokio::task::spawn_blocking(move || {
				println!("Open this URL in a browser:\n\n{authorize_url}\n");
				print!("Paste the redirect URL (empty line cancels): ");
				io::stdout().flush().map_err(|_| Error::Cancelled)?;

				let mut line = String::new();

				io::stdin().lock().read_line(&mut line).map_err(|_| Error::Cancelled)?;

				match line.trim() {
					"" => Err(Error::Cancelled),
					pasted => Url::parse(pasted).map_err(|_| Error::InvalidResponse),
				}
			})
			.await
			.map_err(|_| Error::Cancelled)?
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_id = env::var("UBER_CLIENT_ID")?;
	let redirect_uri = env::var("UBER_REDIRECT_URI")?;
	let config = AuthConfig::builder().client_id(client_id).redirect_uri(redirect_uri).build();
	let sessions = |authorize_url: &Url, _callback_scheme: &str| -> Arc<dyn BrowserSession> {
		Arc::new(TerminalSession { authorize_url: authorize_url.clone() })
	};
	let services = AuthServices::from_config(
		config,
		Arc::new(NoApps),
		Arc::new(ReqwestNetworkProvider::new()?),
		Arc::new(sessions),
	);
	let tokens = Arc::new(MemoryTokenManager::default());
	let dispatcher = AuthDispatcher::new(services, tokens);
	let context = AuthContext::new(
		AuthDestination::InApp,
		AuthProviderKind::AuthorizationCode {
			should_exchange_auth_code: true,
			prompt: Prompt::from([PromptOption::Login]),
			scopes: ScopeSet::new(["profile"])?,
		},
	);
	let (tx, rx) = mpsc::channel();

	dispatcher
		.login(
			context,
			Box::new(move |result| {
				let _ = tx.send(result);
			}),
		)
		.await;

	let client = rx.recv()??;
	let token_type = client.token_type().ok_or_else(|| eyre!("No access token was issued."))?;

	println!("Logged in with a {token_type} token; stored: {}.", dispatcher.is_logged_in()?);

	Ok(())
}
