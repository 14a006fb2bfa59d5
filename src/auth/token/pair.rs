//! Access/refresh token snapshot owned by the credential store.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Immutable snapshot of the tokens held for one session and endpoint.
///
/// The connector never mutates a pair in place: a successful refresh produces a new pair via
/// [`TokenPair::with_access_token`], which is then persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Access token presented on every resource call.
	pub access_token: TokenSecret,
	/// Refresh token exchanged for a new access token, if the provider issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
}
impl TokenPair {
	/// Creates a pair without a refresh token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None }
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Returns a new pair carrying `access_token` while preserving the refresh token.
	pub fn with_access_token(&self, access_token: TokenSecret) -> Self {
		Self { access_token, refresh_token: self.refresh_token.clone() }
	}

	/// Returns `true` when the pair carries a non-empty access token.
	pub fn has_access_token(&self) -> bool {
		!self.access_token.is_empty()
	}

	/// Returns the refresh token when it is present and non-empty.
	pub fn usable_refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_empty())
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}
