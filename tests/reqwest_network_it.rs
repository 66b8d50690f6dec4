// crates.io
use httpmock::prelude::*;
// self
use uber_auth::{
	_preludet::*,
	auth::{AccessToken, AuthDestination, Client, Prefill, ScopeSet},
	config::AuthEndpoints,
	error::NetworkError,
	flows::{AuthServices, AuthorizationCodeAuthProvider},
	http::NetworkProvider,
	oauth::{self, TokenRequest},
};

fn provider_for(
	endpoints: AuthEndpoints,
	outcome: SessionOutcome,
) -> (AuthorizationCodeAuthProvider, Arc<MockBrowserSessionFactory>) {
	let sessions = Arc::new(MockBrowserSessionFactory::new(outcome));
	let services = AuthServices::new(
		Arc::new(MockConfiguration::new("client-it", "app://callback")),
		Arc::new(MockLauncher::new(false)),
		Arc::new(test_reqwest_provider()),
		sessions.clone(),
	)
	.with_endpoints(endpoints);

	(AuthorizationCodeAuthProvider::new(services), sessions)
}

fn token_request() -> TokenRequest {
	TokenRequest {
		client_id: "client-it".into(),
		redirect_uri: "app://callback".into(),
		code: "code-it".into(),
		code_verifier: "verifier-it".into(),
	}
}

#[tokio::test]
async fn in_app_login_pushes_prefill_and_exchanges_over_http() {
	let server = MockServer::start_async().await;
	let endpoints =
		AuthEndpoints::new(&server.base_url()).expect("Mock server base URL should parse.");
	let par = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/v2/par")
				.header("content-type", "application/x-www-form-urlencoded")
				.header("x-uber-sdk-version", "test");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"request_uri\":\"urn:uber:par:it\",\"expires_in\":90}");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/v2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-it\",\"token_type\":\"Bearer\",\"refresh_token\":\"refresh-it\",\"expires_in\":3600,\"scope\":\"profile\"}");
		})
		.await;
	let callback =
		Url::parse("app://callback?code=code-it").expect("Callback fixture should parse.");
	let (provider, sessions) = provider_for(endpoints, SessionOutcome::Callback(callback));
	let probe = CompletionProbe::default();

	provider
		.execute(
			AuthDestination::InApp,
			Some(Prefill { email: Some("rider@example.com".into()), ..Default::default() }),
			probe.completion(),
		)
		.await;

	par.assert_async().await;
	token.assert_async().await;

	let created = sessions.created();
	let authorize_pairs: HashMap<_, _> = created[0].0.query_pairs().into_owned().collect();

	assert_eq!(created[0].0.path(), "/oauth/v2/authorize");
	assert_eq!(authorize_pairs.get("request_uri"), Some(&"urn:uber:par:it".into()));

	let client = probe.take_single().expect("Login should succeed over HTTP.");
	let expected = AccessToken::new("access-it", "Bearer")
		.with_refresh_token("refresh-it")
		.with_expires_in(Duration::hours(1))
		.with_scope(ScopeSet::new(["profile"]).expect("Scope fixture should be valid."));

	assert_eq!(client, Client::with_access_token(expected));
}

#[tokio::test]
async fn redirects_are_reported_instead_of_followed() {
	let server = MockServer::start_async().await;
	let endpoints =
		AuthEndpoints::new(&server.base_url()).expect("Mock server base URL should parse.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/v2/token");
			then.status(302).header("location", "https://elsewhere.example.com/token");
		})
		.await;
	let provider = test_reqwest_provider();
	let err = oauth::execute(&provider, &endpoints, "test", &token_request())
		.await
		.expect_err("Redirect responses must not be followed.");

	mock.assert_async().await;

	assert!(matches!(
		err,
		NetworkError::Status { endpoint: "token", status: 302, oauth_error: None, .. }
	));
}

#[tokio::test]
async fn oauth_error_bodies_are_decoded() {
	let server = MockServer::start_async().await;
	let endpoints =
		AuthEndpoints::new(&server.base_url()).expect("Mock server base URL should parse.");
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/v2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}");
		})
		.await;
	let err = oauth::execute(&test_reqwest_provider(), &endpoints, "test", &token_request())
		.await
		.expect_err("Rejected exchanges must fail.");

	match err {
		NetworkError::Status { status, oauth_error, description, .. } => {
			assert_eq!(status, 400);
			assert_eq!(oauth_error.as_deref(), Some("invalid_grant"));
			assert_eq!(description.as_deref(), Some("already used"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn unreachable_servers_map_to_transport_errors() {
	let endpoints =
		AuthEndpoints::new("http://127.0.0.1:1").expect("Loopback base URL should parse.");
	let provider: Arc<dyn NetworkProvider> = Arc::new(test_reqwest_provider());
	let err = oauth::execute(provider.as_ref(), &endpoints, "test", &token_request())
		.await
		.expect_err("Closed ports must fail.");

	assert!(matches!(err, NetworkError::Transport { endpoint: "token", .. }));
}
