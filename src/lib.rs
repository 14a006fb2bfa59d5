//! OAuth 2.0 connector for protected HTTP resources: attaches cached tokens to outbound calls,
//! reloads them when the resource answers 401/403, and falls back to a single refresh-token
//! exchange before relaying the final response.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod connector;
pub mod error;
pub mod executor;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod outcome;
pub mod refresh;
pub mod relay;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ConfigResolver,
		connector::Connector,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		store::{MemoryStore, TokenStore},
	};

	/// Builds a reqwest HTTP client with a short timeout so failing mocks never hang a test.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.timeout(std::time::Duration::from_secs(5))
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`Connector`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_connector(
		resolver: Arc<dyn ConfigResolver>,
	) -> (Connector, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let connector =
			Connector::with_http_client::<ReqwestHttpClient, ReqwestTransportErrorMapper>(
				store,
				resolver,
				test_reqwest_http_client(),
				ReqwestTransportErrorMapper,
			);

		(connector, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use oauth2::http::{HeaderMap, HeaderValue, Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
