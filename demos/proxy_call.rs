//! Walks one proxied call through the reload and refresh protocol against a local mock provider.
//!
//! 1. Seed a [`MemoryStore`] with a stale access token plus a refresh token.
//! 2. Describe the endpoint with [`StaticConfigResolver`], loaded from JSON the way a deployment
//!    would ship it.
//! 3. Call the resource through [`Connector::call_and_relay`]: the first attempt is rejected,
//!    the reload finds the same token, the refresh exchange issues a new one, and the retry
//!    succeeds.
//! 4. Print what the caller receives and what the store now holds.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_connector::{
	auth::{EndpointId, SessionId, TokenPair},
	config::StaticConfigResolver,
	connector::{CallContext, Connector},
	executor::OutboundCall,
	relay::BufferedResponse,
	store::{MemoryStore, StoreKey},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/users/current.json")
				.header("authorization", "OAuth stale");
			then.status(401).body("{\"error\":\"token expired\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token").body_includes("grant_type=refresh_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh\",\"token_type\":\"bearer\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/users/current.json")
				.header("authorization", "OAuth fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":42,\"full_name\":\"Demo User\"}");
		})
		.await;

	let config = format!(
		r#"{{
			"defaults": {{ "client-id": "demo-client" }},
			"endpoints": {{
				"yammer": {{
					"endpoint-url": "{}",
					"access-token-url": "{}"
				}}
			}}
		}}"#,
		server.url("/api/v1"),
		server.url("/oauth2/token"),
	);
	let resolver = StaticConfigResolver::from_json_slice(config.as_bytes())?;
	let store = Arc::new(MemoryStore::default());
	let session = SessionId::new("demo-session")?;
	let endpoint = EndpointId::new("yammer")?;
	let key = StoreKey::new(session.clone(), endpoint.clone());

	store.insert(key.clone(), TokenPair::new("stale").with_refresh_token("refresh-1"));

	let connector =
		Connector::new(store.clone(), Arc::new(resolver))?.with_token_source(endpoint);
	let mut response = BufferedResponse::default();

	connector
		.call_and_relay(
			&CallContext::new(session),
			&OutboundCall::get("/users/current.json"),
			&mut response,
		)
		.await?;

	println!("status: {:?}", response.status);
	println!("body: {}", String::from_utf8_lossy(&response.body));
	println!("stored: {:?}", store.get(&key));
	println!(
		"refreshes: attempts={} issued={}",
		connector.refresh_metrics.attempts(),
		connector.refresh_metrics.issued()
	);

	Ok(())
}
