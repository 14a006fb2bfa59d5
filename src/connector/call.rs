//! The load, reload, and refresh protocol behind [`Connector::call`].
//!
//! A call makes at most three resource attempts and at most one refresh exchange:
//!
//! 1. The first attempt uses the caller's snapshot or the stored pair. Anything other than
//!    401/403 is final.
//! 2. On 401/403 the pair is reloaded. A changed token gets a second attempt whose result is
//!    final unless it is a 401; an unchanged token goes straight to the refresh step.
//! 3. The refresh step exchanges the refresh token once. Only a new, different access token is
//!    saved and retried, and that third attempt is final whatever its status.
//!
//! Refresh and save run under a per-session guard. A call that acquires the guard after another
//! call already stored a newer token retries with it instead of exchanging again.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	config::{self, EndpointConfig},
	connector::{CallContext, Connector},
	executor::{CallResult, OutboundCall},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	outcome::{CallOutcome, StructuredError},
	relay::{self, ResponseSink},
	store::StoreKey,
};

impl Connector {
	/// Performs `call` on behalf of the caller's session and returns the final outcome.
	///
	/// Failures never escape as panics or `Err`: they are folded into
	/// [`CallOutcome::Failed`] with the matching [`ErrorKind`](crate::outcome::ErrorKind).
	pub async fn call(&self, ctx: &CallContext, call: &OutboundCall) -> CallOutcome {
		const KIND: FlowKind = FlowKind::Call;

		let span = FlowSpan::new(KIND, "call");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run(ctx, call)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result.into()
	}

	/// Performs `call` and writes the final outcome to `sink`.
	///
	/// Nothing reaches the sink until the protocol has settled on its final result.
	pub async fn call_and_relay(
		&self,
		ctx: &CallContext,
		call: &OutboundCall,
		sink: &mut (dyn ResponseSink + Send),
	) -> Result<(), StructuredError> {
		let outcome = self.call(ctx, call).await;

		relay::relay(outcome, sink)
	}

	async fn run(&self, ctx: &CallContext, call: &OutboundCall) -> Result<CallResult> {
		let endpoint_id = config::select_endpoint(
			self.token_source.as_ref(),
			&call.uri,
			ctx.request_path.as_deref(),
		)?;
		let endpoint = self.resolver.resolve(&endpoint_id)?;
		let key = StoreKey::new(ctx.session.clone(), endpoint_id);
		let tokens = match ctx.tokens.as_ref().filter(|tokens| tokens.has_access_token()) {
			Some(tokens) => tokens.clone(),
			None => self.load_tokens(&key).await?,
		};
		let first = self.attempt(1, &endpoint, call, &tokens).await?;

		if !first.is_auth_failure() {
			return Ok(first);
		}

		obs::trace_step("reload", &key.endpoint);

		let reloaded = self.load_tokens(&key).await?;

		if reloaded.access_token == tokens.access_token {
			return self.refresh_and_retry(&key, &endpoint, call, reloaded, first).await;
		}

		let second = self.attempt(2, &endpoint, call, &reloaded).await?;

		if second.status != StatusCode::UNAUTHORIZED {
			return Ok(second);
		}

		self.refresh_and_retry(&key, &endpoint, call, reloaded, second).await
	}

	async fn refresh_and_retry(
		&self,
		key: &StoreKey,
		endpoint: &EndpointConfig,
		call: &OutboundCall,
		current: TokenPair,
		last: CallResult,
	) -> Result<CallResult> {
		let Some(refresh_token) = current.usable_refresh_token() else {
			obs::trace_step("refresh_skipped", &key.endpoint);

			return Ok(last);
		};
		let guard = self.flow_guard(key);
		let singleflight = guard.lock().await;

		// Another call for this session may have refreshed while this one waited on the guard.
		if let Some(stored) = self.store.load(key).await?.filter(|stored| {
			stored.has_access_token() && stored.access_token != current.access_token
		}) {
			drop(singleflight);
			obs::trace_step("refreshed_concurrently", &key.endpoint);

			return self.attempt(3, endpoint, call, &stored).await;
		}

		self.refresh_metrics.record_attempt();

		let issued = self
			.refresher
			.refresh(refresh_token, &endpoint.client_id, &endpoint.token_url)
			.await
			.inspect_err(|_| self.refresh_metrics.record_failure())?;
		let refreshed = match issued {
			Some(token) if token != current.access_token => current.with_access_token(token),
			_ => {
				self.refresh_metrics.record_unchanged();

				return Ok(last);
			},
		};

		self.refresh_metrics.record_issued();
		obs::trace_step("save", &key.endpoint);
		self.store.save(key, refreshed.clone()).await?;

		drop(singleflight);

		self.attempt(3, endpoint, call, &refreshed).await
	}

	async fn attempt(
		&self,
		attempt: u8,
		endpoint: &EndpointConfig,
		call: &OutboundCall,
		tokens: &TokenPair,
	) -> Result<CallResult> {
		let authorization = endpoint.authorization(&tokens.access_token);

		obs::record_resource_attempt(attempt);

		let result = self.executor.perform(endpoint, call, &authorization).await?;

		obs::trace_attempt(attempt, &call.uri, result.status.as_u16());

		Ok(result)
	}

	async fn load_tokens(&self, key: &StoreKey) -> Result<TokenPair> {
		self.store
			.load(key)
			.await?
			.filter(TokenPair::has_access_token)
			.ok_or_else(|| Error::NoToken { endpoint: key.endpoint.clone() })
	}
}
