//! Credential store contract and the built-in in-memory implementation.
//!
//! Tokens are partitioned by [`StoreKey`], the (session, endpoint) pair; a store must never
//! return one session's tokens to another session.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{EndpointId, SessionId, TokenPair},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for per-session, per-endpoint tokens.
///
/// `load` and `save` should be atomic for a given key; the connector relies on a reload
/// observing any pair persisted by a concurrent call.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the tokens stored for the key, if any.
	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<TokenPair>>;

	/// Persists or replaces the tokens stored for the key.
	fn save<'a>(&'a self, key: &'a StoreKey, tokens: TokenPair) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The credential store itself cannot be reached or opened.
	#[error("Credential store is unavailable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
	/// The store was reached but the credentials could not be read or written.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Stored credentials could not be (de)serialized.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
}

/// Unique key identifying a stored token pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Session owning the tokens.
	pub session: SessionId,
	/// Endpoint the tokens grant access to.
	pub endpoint: EndpointId,
}
impl StoreKey {
	/// Builds a key for the session + endpoint pair.
	pub fn new(session: SessionId, endpoint: EndpointId) -> Self {
		Self { session, endpoint }
	}
}
