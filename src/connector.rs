//! Authenticated-call orchestrator.
//!
//! A [`Connector`] owns the collaborators of the protocol (credential store, endpoint
//! configuration, resource executor, and token refresher) and drives them through
//! [`Connector::call`]. Collaborators are injected at construction time; the connector keeps no
//! per-call token state of its own.

mod call;

// self
use crate::{
	_prelude::*,
	auth::{EndpointId, SessionId, TokenPair},
	config::ConfigResolver,
	executor::{HttpRequestExecutor, RequestExecutor},
	http::ConnectorHttpClient,
	oauth::TransportErrorMapper,
	refresh::{HttpTokenRefresher, RefreshMetrics, TokenRefresher},
	store::{StoreKey, TokenStore},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Caller-side inputs of one [`Connector::call`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
	/// Session owning the tokens; store access is always scoped by it.
	pub session: SessionId,
	/// Path of the caller's own request, used to derive the endpoint id when the connector has
	/// no configured token source.
	pub request_path: Option<String>,
	/// Token snapshot the caller already holds; skips the initial store load when non-empty.
	pub tokens: Option<TokenPair>,
}
impl CallContext {
	/// Creates a context for `session` with no request path and no token snapshot.
	pub fn new(session: SessionId) -> Self {
		Self { session, request_path: None, tokens: None }
	}

	/// Sets the caller's request path.
	pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
		self.request_path = Some(path.into());

		self
	}

	/// Attaches a token snapshot.
	pub fn with_tokens(mut self, tokens: TokenPair) -> Self {
		self.tokens = Some(tokens);

		self
	}
}

/// Runs authenticated calls against OAuth-protected resources.
///
/// Cloning is cheap: clones share collaborators, refresh metrics, and the per-session refresh
/// guards.
#[derive(Clone)]
pub struct Connector {
	/// Credential store holding per-session, per-endpoint tokens.
	pub store: Arc<dyn TokenStore>,
	/// Endpoint configuration source.
	pub resolver: Arc<dyn ConfigResolver>,
	/// Performs resource calls.
	pub executor: Arc<dyn RequestExecutor>,
	/// Performs refresh-token exchanges.
	pub refresher: Arc<dyn TokenRefresher>,
	/// Endpoint used for every call; derived from the request path when unset.
	pub token_source: Option<EndpointId>,
	/// Shared counters for refresh exchanges.
	pub refresh_metrics: Arc<RefreshMetrics>,
	flow_guards: Arc<Mutex<HashMap<StoreKey, Arc<AsyncMutex<()>>>>>,
}
impl Connector {
	/// Creates a connector from explicit collaborators.
	pub fn with_parts(
		store: Arc<dyn TokenStore>,
		resolver: Arc<dyn ConfigResolver>,
		executor: Arc<dyn RequestExecutor>,
		refresher: Arc<dyn TokenRefresher>,
	) -> Self {
		Self {
			store,
			resolver,
			executor,
			refresher,
			token_source: None,
			refresh_metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Creates a connector whose executor and refresher share one transport + mapper pair.
	pub fn with_http_client<C, M>(
		store: Arc<dyn TokenStore>,
		resolver: Arc<dyn ConfigResolver>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self
	where
		C: ?Sized + ConnectorHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		let http_client = http_client.into();
		let mapper = mapper.into();
		let executor = <HttpRequestExecutor<C, M>>::new(http_client.clone(), mapper.clone());
		let refresher = <HttpTokenRefresher<C, M>>::new(http_client, mapper);

		Self::with_parts(store, resolver, Arc::new(executor), Arc::new(refresher))
	}

	/// Pins every call to `endpoint` instead of deriving it from the request path.
	pub fn with_token_source(mut self, endpoint: EndpointId) -> Self {
		self.token_source = Some(endpoint);

		self
	}

	pub(crate) fn flow_guard(&self, key: &StoreKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.flow_guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
#[cfg(feature = "reqwest")]
impl Connector {
	/// Creates a connector backed by a reqwest transport that never follows redirects.
	pub fn new(store: Arc<dyn TokenStore>, resolver: Arc<dyn ConfigResolver>) -> Result<Self> {
		Ok(Self::with_http_client::<ReqwestHttpClient, ReqwestTransportErrorMapper>(
			store,
			resolver,
			ReqwestHttpClient::without_redirects()?,
			ReqwestTransportErrorMapper,
		))
	}
}
impl Debug for Connector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connector")
			.field("token_source", &self.token_source)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
