// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use parking_lot::Mutex;
// self
use oauth2_connector::{
	auth::{EndpointId, SessionId, TokenPair, TokenSecret},
	config::{EndpointConfig, EndpointSettings, StaticConfigResolver},
	connector::{CallContext, Connector},
	error::{CalloutError, RefreshError, TransportError},
	executor::{CallResult, ExecutorFuture, OutboundCall, RequestExecutor},
	oauth::oauth2::http::{HeaderValue, StatusCode},
	outcome::{CallOutcome, ErrorKind},
	refresh::{RefreshFuture, TokenRefresher},
	relay::BufferedResponse,
	store::{StoreError, StoreFuture, StoreKey, TokenStore},
	url::Url,
};

#[derive(Default)]
struct ScriptedStore {
	loads: Mutex<VecDeque<Result<Option<TokenPair>, StoreError>>>,
	load_keys: Mutex<Vec<StoreKey>>,
	saves: Mutex<Vec<(StoreKey, TokenPair)>>,
	save_error: Mutex<Option<StoreError>>,
}
impl ScriptedStore {
	fn with_loads(loads: impl IntoIterator<Item = Option<TokenPair>>) -> Self {
		let store = Self::default();

		store.loads.lock().extend(loads.into_iter().map(Ok));

		store
	}

	fn load_count(&self) -> usize {
		self.load_keys.lock().len()
	}

	fn saved(&self) -> Vec<TokenPair> {
		self.saves.lock().iter().map(|(_, tokens)| tokens.clone()).collect()
	}
}
impl TokenStore for ScriptedStore {
	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<TokenPair>> {
		self.load_keys.lock().push(key.clone());

		let next = self.loads.lock().pop_front().unwrap_or(Ok(None));

		Box::pin(async move { next })
	}

	fn save<'a>(&'a self, key: &'a StoreKey, tokens: TokenPair) -> StoreFuture<'a, ()> {
		let result = match self.save_error.lock().clone() {
			Some(err) => Err(err),
			None => {
				self.saves.lock().push((key.clone(), tokens));

				Ok(())
			},
		};

		Box::pin(async move { result })
	}
}

#[derive(Default)]
struct ScriptedExecutor {
	responses: Mutex<VecDeque<Result<CallResult, CalloutError>>>,
	authorizations: Mutex<Vec<String>>,
}
impl ScriptedExecutor {
	fn with_responses(responses: impl IntoIterator<Item = CallResult>) -> Self {
		let executor = Self::default();

		executor.responses.lock().extend(responses.into_iter().map(Ok));

		executor
	}

	fn authorizations(&self) -> Vec<String> {
		self.authorizations.lock().clone()
	}
}
impl RequestExecutor for ScriptedExecutor {
	fn perform<'a>(
		&'a self,
		_: &'a EndpointConfig,
		_: &'a OutboundCall,
		authorization: &'a str,
	) -> ExecutorFuture<'a> {
		self.authorizations.lock().push(authorization.to_owned());

		let next = self
			.responses
			.lock()
			.pop_front()
			.expect("Executor was invoked more often than the test scripted.");

		Box::pin(async move { next })
	}
}

#[derive(Default)]
struct ScriptedRefresher {
	result: Mutex<Option<Result<Option<TokenSecret>, RefreshError>>>,
	calls: Mutex<Vec<(String, String, String)>>,
}
impl ScriptedRefresher {
	fn returning(result: Result<Option<TokenSecret>, RefreshError>) -> Self {
		Self { result: Mutex::new(Some(result)), calls: Default::default() }
	}

	fn call_count(&self) -> usize {
		self.calls.lock().len()
	}
}
impl TokenRefresher for ScriptedRefresher {
	fn refresh<'a>(
		&'a self,
		refresh_token: &'a TokenSecret,
		client_id: &'a str,
		token_url: &'a Url,
	) -> RefreshFuture<'a> {
		self.calls.lock().push((
			refresh_token.expose().to_owned(),
			client_id.to_owned(),
			token_url.to_string(),
		));

		let next = self
			.result
			.lock()
			.take()
			.expect("Refresher was invoked more often than the test scripted.");

		Box::pin(async move { next })
	}
}

struct Harness {
	connector: Connector,
	store: Arc<ScriptedStore>,
	executor: Arc<ScriptedExecutor>,
	refresher: Arc<ScriptedRefresher>,
}
impl Harness {
	fn new(store: ScriptedStore, executor: ScriptedExecutor, refresher: ScriptedRefresher) -> Self {
		let store = Arc::new(store);
		let executor = Arc::new(executor);
		let refresher = Arc::new(refresher);
		let connector =
			Connector::with_parts(store.clone(), resolver(), executor.clone(), refresher.clone())
				.with_token_source(endpoint());

		Self { connector, store, executor, refresher }
	}

	async fn call(&self) -> CallOutcome {
		let call = OutboundCall::get("/1.1/account/verify_credentials.json");

		self.connector.call(&context(), &call).await
	}
}

fn endpoint() -> EndpointId {
	EndpointId::new("twitter").expect("Endpoint fixture should be valid.")
}

fn context() -> CallContext {
	CallContext::new(SessionId::new("alice").expect("Session fixture should be valid."))
}

fn resolver() -> Arc<StaticConfigResolver> {
	Arc::new(StaticConfigResolver::default().with_endpoint(
		endpoint(),
		EndpointSettings::default()
			.resource_url(Url::parse("https://api.twitter.com").expect("URL should parse."))
			.client_id("twitter-client")
			.token_url(
				Url::parse("https://api.twitter.com/oauth2/token").expect("URL should parse."),
			),
	))
}

fn pair(access: &str) -> TokenPair {
	TokenPair::new(access).with_refresh_token("R1")
}

fn response(status: StatusCode, body: &str) -> CallResult {
	let mut result = CallResult::new(status, body);

	result
		.headers
		.insert("x-attempt-body", HeaderValue::from_str(body).expect("Header should be valid."));

	result
}

fn relayed(outcome: &CallOutcome) -> &CallResult {
	outcome.relayed().expect("Outcome should relay a response.")
}

fn failed_kind(outcome: &CallOutcome) -> ErrorKind {
	outcome.error().expect("Outcome should be a structured error.").kind
}

#[tokio::test]
async fn missing_token_yields_no_token_without_outbound_calls() {
	let harness = Harness::new(
		ScriptedStore::with_loads([None]),
		ScriptedExecutor::default(),
		ScriptedRefresher::default(),
	);
	let outcome = harness.call().await;

	assert_eq!(failed_kind(&outcome), ErrorKind::NoToken);
	assert_eq!(outcome.status(), StatusCode::UNAUTHORIZED);
	assert!(harness.executor.authorizations().is_empty());
	assert_eq!(harness.store.load_count(), 1);
}

#[tokio::test]
async fn empty_stored_access_token_counts_as_missing() {
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(TokenPair::new(""))]),
		ScriptedExecutor::default(),
		ScriptedRefresher::default(),
	);

	assert_eq!(failed_kind(&harness.call().await), ErrorKind::NoToken);
	assert!(harness.executor.authorizations().is_empty());
}

#[tokio::test]
async fn non_auth_failures_are_relayed_verbatim_without_reload() {
	let not_found = response(StatusCode::NOT_FOUND, "missing");
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1"))]),
		ScriptedExecutor::with_responses([not_found.clone()]),
		ScriptedRefresher::default(),
	);
	let outcome = harness.call().await;

	assert_eq!(relayed(&outcome), &not_found);
	assert_eq!(harness.executor.authorizations(), ["OAuth T1"]);
	assert_eq!(harness.store.load_count(), 1);
	assert_eq!(harness.refresher.call_count(), 0);
}

#[tokio::test]
async fn unchanged_reload_with_rejected_refresh_relays_the_first_response() {
	let stale = response(StatusCode::UNAUTHORIZED, "stale");
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T1"))]),
		ScriptedExecutor::with_responses([stale.clone()]),
		ScriptedRefresher::returning(Ok(None)),
	);
	let outcome = harness.call().await;

	assert_eq!(relayed(&outcome), &stale);
	assert_eq!(harness.executor.authorizations().len(), 1);
	assert_eq!(harness.refresher.call_count(), 1);
	assert!(harness.store.saved().is_empty());
	assert_eq!(harness.connector.refresh_metrics.unchanged(), 1);
}

#[tokio::test]
async fn changed_reload_retries_once_and_skips_refresh() {
	let ok = response(StatusCode::OK, "hello");
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T2"))]),
		ScriptedExecutor::with_responses([response(StatusCode::UNAUTHORIZED, "stale"), ok.clone()]),
		ScriptedRefresher::default(),
	);
	let outcome = harness.call().await;

	assert_eq!(relayed(&outcome), &ok);
	assert_eq!(harness.executor.authorizations(), ["OAuth T1", "OAuth T2"]);
	assert_eq!(harness.refresher.call_count(), 0);
	assert!(harness.store.saved().is_empty());
}

#[tokio::test]
async fn forbidden_after_changed_reload_is_final() {
	let forbidden = response(StatusCode::FORBIDDEN, "denied");
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T2"))]),
		ScriptedExecutor::with_responses([
			response(StatusCode::FORBIDDEN, "first"),
			forbidden.clone(),
		]),
		ScriptedRefresher::default(),
	);
	let outcome = harness.call().await;

	assert_eq!(relayed(&outcome), &forbidden);
	assert_eq!(harness.refresher.call_count(), 0);
}

#[tokio::test]
async fn forbidden_with_unchanged_reload_refreshes_saves_and_retries() {
	let ok = response(StatusCode::OK, "welcome");
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T1"))]),
		ScriptedExecutor::with_responses([response(StatusCode::FORBIDDEN, "denied"), ok.clone()]),
		ScriptedRefresher::returning(Ok(Some(TokenSecret::new("T2")))),
	);
	let outcome = harness.call().await;

	assert_eq!(relayed(&outcome), &ok);
	assert_eq!(harness.executor.authorizations(), ["OAuth T1", "OAuth T2"]);
	assert_eq!(harness.store.saved(), [TokenPair::new("T2").with_refresh_token("R1")]);
	assert_eq!(
		harness.refresher.calls.lock().as_slice(),
		[(
			"R1".to_owned(),
			"twitter-client".to_owned(),
			"https://api.twitter.com/oauth2/token".to_owned()
		)]
	);
	assert_eq!(harness.connector.refresh_metrics.issued(), 1);
}

#[tokio::test]
async fn refresh_retry_result_is_final_even_when_unauthorized() {
	let still_denied = response(StatusCode::UNAUTHORIZED, "third");
	let harness = Harness::new(
		ScriptedStore::with_loads([
			Some(pair("T1")),
			Some(TokenPair::new("T2").with_refresh_token("R2")),
		]),
		ScriptedExecutor::with_responses([
			response(StatusCode::UNAUTHORIZED, "first"),
			response(StatusCode::UNAUTHORIZED, "second"),
			still_denied.clone(),
		]),
		ScriptedRefresher::returning(Ok(Some(TokenSecret::new("T3")))),
	);
	let outcome = harness.call().await;

	assert_eq!(relayed(&outcome), &still_denied);
	assert_eq!(harness.executor.authorizations(), ["OAuth T1", "OAuth T2", "OAuth T3"]);
	assert_eq!(harness.refresher.calls.lock()[0].0, "R2");
	assert_eq!(harness.store.saved(), [TokenPair::new("T3").with_refresh_token("R2")]);
}

#[tokio::test]
async fn refresh_failures_surface_as_refresh_token_errors() {
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T1"))]),
		ScriptedExecutor::with_responses([response(StatusCode::UNAUTHORIZED, "stale")]),
		ScriptedRefresher::returning(Err(RefreshError::Transport(TransportError::Other {
			message: "connection reset".into(),
		}))),
	);
	let outcome = harness.call().await;

	assert_eq!(failed_kind(&outcome), ErrorKind::RefreshToken);
	assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert!(harness.store.saved().is_empty());
	assert_eq!(harness.connector.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn refresh_returning_the_cached_token_relays_the_last_response() {
	let stale = response(StatusCode::UNAUTHORIZED, "stale");
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T1"))]),
		ScriptedExecutor::with_responses([stale.clone()]),
		ScriptedRefresher::returning(Ok(Some(TokenSecret::new("T1")))),
	);

	assert_eq!(relayed(&harness.call().await), &stale);
	assert_eq!(harness.executor.authorizations().len(), 1);
	assert!(harness.store.saved().is_empty());
}

#[tokio::test]
async fn missing_refresh_token_skips_the_exchange() {
	let stale = response(StatusCode::UNAUTHORIZED, "stale");
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(TokenPair::new("T1")), Some(TokenPair::new("T1"))]),
		ScriptedExecutor::with_responses([stale.clone()]),
		ScriptedRefresher::default(),
	);

	assert_eq!(relayed(&harness.call().await), &stale);
	assert_eq!(harness.refresher.call_count(), 0);
}

#[tokio::test]
async fn token_vanishing_on_reload_yields_no_token() {
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), None]),
		ScriptedExecutor::with_responses([response(StatusCode::UNAUTHORIZED, "stale")]),
		ScriptedRefresher::default(),
	);

	assert_eq!(failed_kind(&harness.call().await), ErrorKind::NoToken);
	assert_eq!(harness.store.load_count(), 2);
}

#[tokio::test]
async fn store_failures_map_to_credential_error_kinds() {
	let unavailable = ScriptedStore::default();

	unavailable
		.loads
		.lock()
		.push_back(Err(StoreError::Unavailable { message: "vault offline".into() }));

	let harness =
		Harness::new(unavailable, ScriptedExecutor::default(), ScriptedRefresher::default());

	assert_eq!(failed_kind(&harness.call().await), ErrorKind::CredentialStore);

	let corrupt = ScriptedStore::default();

	corrupt
		.loads
		.lock()
		.push_back(Err(StoreError::Serialization { message: "bad record".into() }));

	let harness = Harness::new(corrupt, ScriptedExecutor::default(), ScriptedRefresher::default());
	let outcome = harness.call().await;

	assert_eq!(failed_kind(&outcome), ErrorKind::FetchCredentials);
	assert!(harness.executor.authorizations().is_empty());
}

#[tokio::test]
async fn save_failures_stop_before_the_final_attempt() {
	let store = ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T1"))]);

	*store.save_error.lock() = Some(StoreError::Unavailable { message: "vault offline".into() });

	let harness = Harness::new(
		store,
		ScriptedExecutor::with_responses([response(StatusCode::UNAUTHORIZED, "stale")]),
		ScriptedRefresher::returning(Ok(Some(TokenSecret::new("T2")))),
	);

	assert_eq!(failed_kind(&harness.call().await), ErrorKind::CredentialStore);
	assert_eq!(harness.executor.authorizations().len(), 1);
}

#[tokio::test]
async fn callout_failures_surface_as_callout_errors() {
	let executor = ScriptedExecutor::default();

	executor.responses.lock().push_back(Err(CalloutError::Transport(TransportError::Other {
		message: "connection refused".into(),
	})));

	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1"))]),
		executor,
		ScriptedRefresher::default(),
	);
	let outcome = harness.call().await;
	let error = outcome.error().expect("Outcome should be a structured error.");
	let cause = error.cause.as_ref().expect("Callout errors should carry a cause.");

	assert_eq!(error.kind, ErrorKind::Callout);
	assert!(cause.trace.contains("connection refused"));
}

#[tokio::test]
async fn repeated_successful_calls_never_save() {
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T1"))]),
		ScriptedExecutor::with_responses([
			response(StatusCode::OK, "one"),
			response(StatusCode::OK, "two"),
		]),
		ScriptedRefresher::default(),
	);
	let first = harness.call().await;
	let second = harness.call().await;

	assert_eq!(relayed(&first).body, b"one");
	assert_eq!(relayed(&second).body, b"two");
	assert!(harness.store.saved().is_empty());
	assert_eq!(harness.refresher.call_count(), 0);
}

#[tokio::test]
async fn caller_snapshot_skips_the_initial_load() {
	let harness = Harness::new(
		ScriptedStore::default(),
		ScriptedExecutor::with_responses([response(StatusCode::OK, "hello")]),
		ScriptedRefresher::default(),
	);
	let ctx = context().with_tokens(pair("T9"));
	let outcome = harness.connector.call(&ctx, &OutboundCall::get("/me")).await;

	assert_eq!(outcome.status(), StatusCode::OK);
	assert_eq!(harness.executor.authorizations(), ["OAuth T9"]);
	assert_eq!(harness.store.load_count(), 0);
}

#[tokio::test]
async fn endpoint_is_derived_from_the_request_path_without_a_token_source() {
	let store = Arc::new(ScriptedStore::with_loads([Some(pair("T1"))]));
	let executor = Arc::new(ScriptedExecutor::with_responses([response(StatusCode::OK, "hi")]));
	let connector = Connector::with_parts(
		store.clone(),
		resolver(),
		executor.clone(),
		Arc::new(ScriptedRefresher::default()),
	);
	let ctx = context().with_request_path("/share/proxy/twitter/1.1/statuses.json");
	let outcome = connector.call(&ctx, &OutboundCall::get("/1.1/statuses.json")).await;

	assert_eq!(outcome.status(), StatusCode::OK);
	assert_eq!(store.load_keys.lock()[0].endpoint, endpoint());

	let ctx = context().with_request_path("/share/proxy/jive/1.1/statuses.json");
	let outcome = connector.call(&ctx, &OutboundCall::get("/1.1/statuses.json")).await;

	assert_eq!(failed_kind(&outcome), ErrorKind::FetchCredentials);
	assert_eq!(executor.authorizations().len(), 1);
}

#[tokio::test]
async fn call_and_relay_writes_only_the_final_response() {
	let harness = Harness::new(
		ScriptedStore::with_loads([Some(pair("T1")), Some(pair("T2"))]),
		ScriptedExecutor::with_responses([
			response(StatusCode::UNAUTHORIZED, "stale"),
			response(StatusCode::OK, "fresh"),
		]),
		ScriptedRefresher::default(),
	);
	let mut sink = BufferedResponse::default();

	harness
		.connector
		.call_and_relay(&context(), &OutboundCall::get("/me"), &mut sink)
		.await
		.expect("Relay should succeed.");

	assert_eq!(sink.status, Some(StatusCode::OK));
	assert_eq!(sink.headers["x-attempt-body"], "fresh");
	assert_eq!(sink.body, b"fresh");
}

#[tokio::test]
async fn token_refreshed_by_another_call_is_used_without_exchanging() {
	let ok = response(StatusCode::OK, "fresh");
	let harness = Harness::new(
		ScriptedStore::with_loads([
			Some(pair("T1")),
			Some(pair("T1")),
			Some(TokenPair::new("T2").with_refresh_token("R1")),
		]),
		ScriptedExecutor::with_responses([response(StatusCode::UNAUTHORIZED, "stale"), ok.clone()]),
		ScriptedRefresher::default(),
	);

	assert_eq!(relayed(&harness.call().await), &ok);
	assert_eq!(harness.executor.authorizations(), ["OAuth T1", "OAuth T2"]);
	assert_eq!(harness.refresher.call_count(), 0);
	assert!(harness.store.saved().is_empty());
}
