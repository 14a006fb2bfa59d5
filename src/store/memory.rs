//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	store::{StoreError, StoreFuture, StoreKey, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, TokenPair>>>;

/// Thread-safe storage backend that keeps token pairs in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns the pair currently stored for `key` without going through the async contract.
	pub fn get(&self, key: &StoreKey) -> Option<TokenPair> {
		self.0.read().get(key).cloned()
	}

	/// Stores `tokens` for `key` synchronously; handy for seeding fixtures.
	pub fn insert(&self, key: StoreKey, tokens: TokenPair) {
		self.0.write().insert(key, tokens);
	}

	fn save_now(map: StoreMap, key: StoreKey, tokens: TokenPair) -> Result<(), StoreError> {
		map.write().insert(key, tokens);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn load<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<TokenPair>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn save<'a>(&'a self, key: &'a StoreKey, tokens: TokenPair) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Self::save_now(map, key, tokens) })
	}
}
