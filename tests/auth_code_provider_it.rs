// std
use std::{
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration as StdDuration,
};
// crates.io
use tokio::sync::{Barrier, Notify};
// self
use uber_auth::{
	_preludet::*,
	auth::{AccessToken, AuthDestination, Client, Prefill, Prompt, PromptOption, UberApp},
	config::AuthEndpoints,
	error::{NetworkError, OAuthError},
	flows::{AuthServices, AuthorizationCodeAuthProvider},
	http::{HttpRequest, HttpResponse, NetworkFuture, NetworkProvider},
	pkce::PkcePair,
	platform::{BrowserSession, BrowserSessionFactory, PlatformFuture},
};

const CLIENT_ID: &str = "test_client_id";
const REDIRECT_URI: &str = "app://callback";
const TOKEN_BODY: &str = r#"{"access_token":"123","token_type":"test_token"}"#;

fn harness(
	configuration: MockConfiguration,
	launcher: MockLauncher,
	network: MockNetwork,
	outcome: SessionOutcome,
) -> TestHarness {
	TestHarness::new(configuration, launcher, network, MockBrowserSessionFactory::new(outcome))
}

fn configuration() -> MockConfiguration {
	MockConfiguration::new(CLIENT_ID, REDIRECT_URI)
}

fn url(value: &str) -> Url {
	Url::parse(value).expect("URL fixture should parse.")
}

fn query(url: &Url) -> HashMap<String, String> {
	url.query_pairs().into_owned().collect()
}

fn cancelled() -> SessionOutcome {
	SessionOutcome::Cancelled
}

// Resolves with `outcome` only after `release` is notified.
struct GatedSession {
	release: Arc<Notify>,
	outcome: SessionOutcome,
}
impl BrowserSession for GatedSession {
	fn start(&self) -> PlatformFuture<'_, Result<Url>> {
		Box::pin(async move {
			self.release.notified().await;

			match &self.outcome {
				SessionOutcome::Callback(url) => Ok(url.clone()),
				SessionOutcome::Cancelled => Err(Error::Cancelled),
			}
		})
	}
}

// Records the request immediately but holds the response until `release` is notified.
struct GatedNetwork {
	inner: Arc<MockNetwork>,
	release: Arc<Notify>,
}
impl NetworkProvider for GatedNetwork {
	fn send(&self, endpoint: &'static str, request: HttpRequest) -> NetworkFuture<'_, HttpResponse> {
		let response = self.inner.send(endpoint, request);

		Box::pin(async move {
			self.release.notified().await;

			response.await
		})
	}
}

fn gated_sessions(
	release: Arc<Notify>,
	outcome: SessionOutcome,
) -> (Arc<dyn BrowserSessionFactory>, Arc<AtomicUsize>) {
	let created = Arc::new(AtomicUsize::new(0));
	let counter = created.clone();
	let factory = move |_: &Url, _: &str| -> Arc<dyn BrowserSession> {
		counter.fetch_add(1, Ordering::SeqCst);

		Arc::new(GatedSession { release: release.clone(), outcome: outcome.clone() })
	};

	(Arc::new(factory), created)
}

async fn wait_until(condition: impl Fn() -> bool) {
	tokio::time::timeout(StdDuration::from_secs(5), async {
		while !condition() {
			tokio::time::sleep(StdDuration::from_millis(5)).await;
		}
	})
	.await
	.expect("Condition should hold within five seconds.");
}

#[tokio::test]
async fn native_destination_probes_in_order_and_launches_first_installed_app() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, false).with_installed(UberApp::Eats, true),
		MockLauncher::new(true),
		MockNetwork::default(),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();

	provider
		.execute(
			AuthDestination::Native {
				app_priority: vec![UberApp::Rides, UberApp::Eats, UberApp::Driver],
			},
			None,
			probe.completion(),
		)
		.await;

	assert_eq!(harness.configuration.probes(), vec![UberApp::Rides, UberApp::Eats]);

	let launched = harness.launcher.launched();

	assert_eq!(launched.len(), 1);
	assert_eq!(launched[0].host_str(), Some("eats.uber.com"));
	assert_eq!(launched[0].path(), "/oauth/v2/universal/authorize");
	assert!(harness.sessions.created().is_empty());
	assert_eq!(probe.count(), 0);
	assert!(provider.is_in_flight());
}

#[tokio::test]
async fn execute_while_in_flight_fails_without_side_effects() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default(),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let first = CompletionProbe::default();
	let second = CompletionProbe::default();

	provider.execute(AuthDestination::native(), None, first.completion()).await;

	let probes_before = harness.configuration.probes().len();

	provider.execute(AuthDestination::native(), None, second.completion()).await;

	assert!(matches!(second.take_single(), Err(Error::ExistingAuthSession)));
	assert_eq!(harness.configuration.probes().len(), probes_before);
	assert_eq!(harness.launcher.launched().len(), 1);
	assert_eq!(first.count(), 0);
	assert!(provider.is_in_flight());
}

#[tokio::test]
async fn disabled_code_exchange_omits_pkce_and_returns_the_code() {
	let harness = harness(
		configuration(),
		MockLauncher::new(false),
		MockNetwork::default(),
		SessionOutcome::Callback(url("app://callback?code=123")),
	);
	let provider =
		AuthorizationCodeAuthProvider::new(harness.services()).with_code_exchange(false);
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::InApp, None, probe.completion()).await;

	let created = harness.sessions.created();

	assert_eq!(created.len(), 1);

	let (authorize_url, callback_scheme) = &created[0];

	assert_eq!(callback_scheme, "app");
	assert!(!authorize_url.as_str().contains("code_challenge"));
	assert!(!authorize_url.as_str().contains("code_challenge_method"));
	assert_eq!(
		probe.take_single().expect("Code callback should succeed."),
		Client::with_authorization_code("123")
	);
	assert!(harness.network.requests().is_empty());
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn declined_launch_falls_back_to_browser_with_full_prompt() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(false),
		MockNetwork::default(),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services())
		.with_prompt(Prompt::from([PromptOption::Login, PromptOption::Consent]));
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::native(), None, probe.completion()).await;

	let launched = harness.launcher.launched();

	assert_eq!(launched.len(), 1);
	assert_eq!(query(&launched[0]).get("prompt").map(String::as_str), Some("consent"));

	let created = harness.sessions.created();

	assert_eq!(created.len(), 1);
	assert_eq!(created[0].0.host_str(), Some("auth.uber.com"));
	assert_eq!(query(&created[0].0).get("prompt").map(String::as_str), Some("login consent"));
	assert_eq!(harness.sessions.starts(), 1);
	assert!(matches!(probe.take_single(), Err(Error::Cancelled)));
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn no_installed_app_goes_straight_to_the_browser() {
	let harness = harness(
		configuration()
			.with_installed(UberApp::Rides, false)
			.with_installed(UberApp::Eats, false)
			.with_installed(UberApp::Driver, false),
		MockLauncher::new(true),
		MockNetwork::default(),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::native(), None, probe.completion()).await;

	assert_eq!(harness.configuration.probes(), UberApp::ALL.to_vec());
	assert!(harness.launcher.launched().is_empty());
	assert_eq!(harness.sessions.created().len(), 1);
	assert!(matches!(probe.take_single(), Err(Error::Cancelled)));
}

#[tokio::test]
async fn mismatched_callback_leaves_the_attempt_untouched() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default(),
		cancelled(),
	);
	let provider =
		AuthorizationCodeAuthProvider::new(harness.services()).with_code_exchange(false);
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::native(), None, probe.completion()).await;

	assert!(!provider.handle(&url("other://callback?code=123")).await);
	assert!(!provider.handle(&url("app://elsewhere?code=123")).await);
	assert!(provider.is_in_flight());
	assert_eq!(probe.count(), 0);
	assert!(provider.handle(&url("app://callback?code=123")).await);
	assert_eq!(
		probe.take_single().expect("Matching callback should succeed."),
		Client::with_authorization_code("123")
	);
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn callback_errors_are_classified() {
	let cases: [(&str, fn(&Error) -> bool); 3] = [
		("app://callback?error=invalid_request", |e| {
			matches!(e, Error::OAuth(OAuthError::InvalidRequest))
		}),
		("app://callback?error=some_unrecognized_value", |e| matches!(e, Error::InvalidAuthCode)),
		("app://callback?state=abc", |e| matches!(e, Error::InvalidResponse)),
	];
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default(),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());

	for (callback, expected) in cases {
		let probe = CompletionProbe::default();

		provider.execute(AuthDestination::native(), None, probe.completion()).await;

		assert!(provider.handle(&url(callback)).await, "{callback} should be consumed.");

		let err = probe.take_single().expect_err("Error callbacks must fail.");

		assert!(expected(&err), "{callback} produced {err:?}.");
		assert!(!provider.is_in_flight());
	}

	assert!(harness.network.requests().is_empty());
}

#[tokio::test]
async fn native_login_exchanges_the_code_for_a_token() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default().respond("token", 200, TOKEN_BODY),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::native(), None, probe.completion()).await;

	assert!(provider.handle(&url("app://callback?code=123")).await);
	assert_eq!(
		probe.take_single().expect("Token exchange should succeed."),
		Client::with_access_token(AccessToken::new("123", "test_token"))
	);

	let requests = harness.network.requests_to("token");

	assert_eq!(requests.len(), 1);

	let form = &requests[0].form;
	let verifier = form.get("code_verifier").expect("Exchange must carry the verifier.");
	let launched = query(&harness.launcher.launched()[0]);

	assert_eq!(requests[0].uri, "https://auth.uber.com/oauth/v2/token");
	assert_eq!(requests[0].sdk_version.as_deref(), Some("test"));
	assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
	assert_eq!(form.get("code").map(String::as_str), Some("123"));
	assert_eq!(form.get("client_id").map(String::as_str), Some(CLIENT_ID));
	assert_eq!(form.get("redirect_uri").map(String::as_str), Some(REDIRECT_URI));
	assert_eq!(
		launched.get("code_challenge").map(String::as_str),
		Some(PkcePair::from_verifier(verifier.as_str()).challenge())
	);
	assert_eq!(launched.get("code_challenge_method").map(String::as_str), Some("S256"));
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn failed_exchange_surfaces_the_network_error_and_frees_the_slot() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default().respond("token", 400, r#"{"error":"invalid_grant"}"#),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::native(), None, probe.completion()).await;

	assert!(provider.handle(&url("app://callback?code=123")).await);

	let err = probe.take_single().expect_err("Rejected exchanges must fail.");

	assert!(matches!(
		err,
		Error::Network(NetworkError::Status { status: 400, ref oauth_error, .. })
			if oauth_error.as_deref() == Some("invalid_grant")
	));
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn invalid_redirect_uri_fails_before_any_interaction() {
	for (client_id, redirect_uri) in [(CLIENT_ID, "uber"), (CLIENT_ID, ""), ("", REDIRECT_URI)] {
		let harness = harness(
			MockConfiguration::new(client_id, redirect_uri),
			MockLauncher::new(true),
			MockNetwork::default(),
			cancelled(),
		);
		let provider = AuthorizationCodeAuthProvider::new(harness.services());
		let probe = CompletionProbe::default();

		provider
			.execute(
				AuthDestination::native(),
				Some(Prefill { email: Some("rider@example.com".into()), ..Default::default() }),
				probe.completion(),
			)
			.await;

		assert!(matches!(probe.take_single(), Err(Error::InvalidRequest { .. })));
		assert!(harness.configuration.probes().is_empty());
		assert!(harness.launcher.launched().is_empty());
		assert!(harness.network.requests().is_empty());
		assert!(harness.sessions.created().is_empty());
		assert!(!provider.is_in_flight());
	}
}

#[tokio::test]
async fn prefill_pushes_authorization_and_embeds_the_request_uri() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default()
			.respond("par", 201, r#"{"request_uri":"urn:uber:par:abc","expires_in":60}"#),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();
	let prefill = Prefill {
		email: Some("rider@example.com".into()),
		first_name: Some("Ada".into()),
		..Default::default()
	};

	provider.execute(AuthDestination::native(), Some(prefill), probe.completion()).await;

	let requests = harness.network.requests_to("par");

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].uri, "https://auth.uber.com/oauth/v2/par");
	assert_eq!(requests[0].form.get("response_type").map(String::as_str), Some("code"));
	assert!(requests[0].form.contains_key("login_hint"));
	assert_eq!(
		query(&harness.launcher.launched()[0]).get("request_uri").map(String::as_str),
		Some("urn:uber:par:abc")
	);
	assert_eq!(probe.count(), 0);
}

#[tokio::test]
async fn logins_without_prefill_skip_the_pushed_request() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default(),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::native(), None, probe.completion()).await;

	assert!(harness.network.requests_to("par").is_empty());
	assert!(!query(&harness.launcher.launched()[0]).contains_key("request_uri"));
}

#[tokio::test]
async fn failed_pushed_request_aborts_the_attempt() {
	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default().respond("par", 500, "{}"),
		cancelled(),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();

	provider
		.execute(
			AuthDestination::native(),
			Some(Prefill { phone_number: Some("5555550100".into()), ..Default::default() }),
			probe.completion(),
		)
		.await;

	assert!(matches!(
		probe.take_single(),
		Err(Error::Network(NetworkError::Status { endpoint: "par", status: 500, .. }))
	));
	assert!(harness.launcher.launched().is_empty());
	assert!(harness.sessions.created().is_empty());
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn browser_returning_a_foreign_url_fails_the_attempt() {
	let harness = harness(
		configuration(),
		MockLauncher::new(false),
		MockNetwork::default(),
		SessionOutcome::Callback(url("https://auth.uber.com/oauth/v2/authorize")),
	);
	let provider = AuthorizationCodeAuthProvider::new(harness.services());
	let probe = CompletionProbe::default();

	provider.execute(AuthDestination::InApp, None, probe.completion()).await;

	assert!(matches!(probe.take_single(), Err(Error::InvalidResponse)));
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn callbacks_without_an_attempt_are_ignored() {
	let harness =
		harness(configuration(), MockLauncher::new(true), MockNetwork::default(), cancelled());
	let provider = AuthorizationCodeAuthProvider::new(harness.services());

	assert!(!provider.handle(&url("app://callback?code=123")).await);
}

#[tokio::test]
async fn provider_is_reusable_after_every_terminal_outcome() {
	let harness = harness(
		configuration(),
		MockLauncher::new(false),
		MockNetwork::default(),
		SessionOutcome::Callback(url("app://callback?code=abc")),
	);
	let provider =
		AuthorizationCodeAuthProvider::new(harness.services()).with_code_exchange(false);

	for _ in 0..3 {
		let probe = CompletionProbe::default();

		provider.execute(AuthDestination::InApp, None, probe.completion()).await;

		assert_eq!(
			probe.take_single().expect("Each attempt should succeed."),
			Client::with_authorization_code("abc")
		);
	}

	assert_eq!(harness.sessions.starts(), 3);
}

#[tokio::test]
async fn late_browser_session_cannot_complete_a_newer_attempt() {
	let release = Arc::new(Notify::new());
	let (sessions, created) =
		gated_sessions(release.clone(), SessionOutcome::Callback(url("app://callback?code=STALE")));
	let launcher = Arc::new(MockLauncher::new(true));
	let services = AuthServices::new(
		Arc::new(configuration().with_installed(UberApp::Rides, true)),
		launcher.clone(),
		Arc::new(MockNetwork::default()),
		sessions,
	)
	.with_endpoints(AuthEndpoints::default());
	let provider =
		Arc::new(AuthorizationCodeAuthProvider::new(services).with_code_exchange(false));
	let first = CompletionProbe::default();
	let second = CompletionProbe::default();
	let login = tokio::spawn({
		let provider = provider.clone();
		let completion = first.completion();

		async move { provider.execute(AuthDestination::InApp, None, completion).await }
	});

	wait_until(|| created.load(Ordering::SeqCst) == 1).await;

	assert!(provider.handle(&url("app://callback?code=FIRST")).await);
	assert_eq!(
		first.take_single().expect("Host callback should complete the first attempt."),
		Client::with_authorization_code("FIRST")
	);

	provider.execute(AuthDestination::native(), None, second.completion()).await;

	assert_eq!(launcher.launched().len(), 1);
	assert!(provider.is_in_flight());

	release.notify_one();
	login.await.expect("Login task should not panic.");

	assert_eq!(second.count(), 0);
	assert!(provider.is_in_flight());
	assert!(provider.handle(&url("app://callback?code=SECOND")).await);
	assert_eq!(
		second.take_single().expect("Second attempt should take its own callback."),
		Client::with_authorization_code("SECOND")
	);
	assert_eq!(first.count(), 0);
}

#[tokio::test]
async fn browser_cancellation_after_the_callback_keeps_the_exchange_result() {
	let session_release = Arc::new(Notify::new());
	let network_release = Arc::new(Notify::new());
	let (sessions, created) = gated_sessions(session_release.clone(), SessionOutcome::Cancelled);
	let network = Arc::new(MockNetwork::default().respond("token", 200, TOKEN_BODY));
	let services = AuthServices::new(
		Arc::new(configuration()),
		Arc::new(MockLauncher::new(false)),
		Arc::new(GatedNetwork { inner: network.clone(), release: network_release.clone() }),
		sessions,
	)
	.with_endpoints(AuthEndpoints::default());
	let provider = Arc::new(AuthorizationCodeAuthProvider::new(services));
	let probe = CompletionProbe::default();
	let login = tokio::spawn({
		let provider = provider.clone();
		let completion = probe.completion();

		async move { provider.execute(AuthDestination::InApp, None, completion).await }
	});

	wait_until(|| created.load(Ordering::SeqCst) == 1).await;

	let callback = tokio::spawn({
		let provider = provider.clone();

		async move { provider.handle(&url("app://callback?code=123")).await }
	});

	wait_until(|| network.requests_to("token").len() == 1).await;
	session_release.notify_one();
	login.await.expect("Login task should not panic.");

	assert_eq!(probe.count(), 0);
	assert!(provider.is_in_flight());

	network_release.notify_one();

	assert!(callback.await.expect("Callback task should not panic."));
	assert_eq!(
		probe.take_single().expect("Exchange result should reach the completion."),
		Client::with_access_token(AccessToken::new("123", "test_token"))
	);
	assert!(!provider.is_in_flight());
}

#[tokio::test]
async fn browser_cancellation_while_awaiting_the_callback_ends_the_attempt() {
	let release = Arc::new(Notify::new());
	let (sessions, created) = gated_sessions(release.clone(), SessionOutcome::Cancelled);
	let services = AuthServices::new(
		Arc::new(configuration()),
		Arc::new(MockLauncher::new(false)),
		Arc::new(MockNetwork::default()),
		sessions,
	)
	.with_endpoints(AuthEndpoints::default());
	let provider = AuthorizationCodeAuthProvider::new(services);
	let probe = CompletionProbe::default();

	release.notify_one();
	provider.execute(AuthDestination::InApp, None, probe.completion()).await;

	assert_eq!(created.load(Ordering::SeqCst), 1);
	assert!(matches!(probe.take_single(), Err(Error::Cancelled)));
	assert!(!provider.is_in_flight());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_logins_admit_exactly_one_attempt() {
	const CALLERS: usize = 8;

	let harness = harness(
		configuration().with_installed(UberApp::Rides, true),
		MockLauncher::new(true),
		MockNetwork::default(),
		cancelled(),
	);
	let provider = Arc::new(
		AuthorizationCodeAuthProvider::new(harness.services()).with_code_exchange(false),
	);
	let barrier = Arc::new(Barrier::new(CALLERS));
	let probes = (0..CALLERS).map(|_| CompletionProbe::default()).collect::<Vec<_>>();
	let tasks = probes
		.iter()
		.map(|probe| {
			let provider = provider.clone();
			let barrier = barrier.clone();
			let completion = probe.completion();

			tokio::spawn(async move {
				barrier.wait().await;
				provider.execute(AuthDestination::native(), None, completion).await;
			})
		})
		.collect::<Vec<_>>();

	for task in tasks {
		task.await.expect("Login task should not panic.");
	}

	let (pending, rejected): (Vec<_>, Vec<_>) = probes.iter().partition(|probe| probe.count() == 0);

	assert_eq!(pending.len(), 1);
	assert_eq!(rejected.len(), CALLERS - 1);

	for probe in rejected {
		assert!(matches!(probe.take_single(), Err(Error::ExistingAuthSession)));
	}

	assert_eq!(harness.launcher.launched().len(), 1);
	assert!(provider.is_in_flight());
	assert!(provider.handle(&url("app://callback?code=abc")).await);
	assert_eq!(
		pending[0].take_single().expect("Admitted attempt should take the callback."),
		Client::with_authorization_code("abc")
	);
}
