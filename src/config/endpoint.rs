//! Endpoint configuration resolved once per call.

// self
use crate::{
	_prelude::*,
	auth::{EndpointId, TokenSecret},
	config::EndpointConfigBuilder,
	error::CalloutError,
};

/// Scheme written in front of the access token in the `Authorization` header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthScheme {
	/// `Authorization: OAuth <token>`.
	#[default]
	OAuth,
	/// `Authorization: Bearer <token>`.
	Bearer,
	/// Any other scheme configured for the endpoint.
	Custom(String),
}
impl AuthScheme {
	/// Returns the scheme exactly as it appears on the wire.
	pub fn as_str(&self) -> &str {
		match self {
			Self::OAuth => "OAuth",
			Self::Bearer => "Bearer",
			Self::Custom(scheme) => scheme,
		}
	}

	/// Formats the header value `"<scheme> <token>"`.
	pub fn authorization(&self, token: &TokenSecret) -> String {
		format!("{} {}", self.as_str(), token.expose())
	}
}
impl From<String> for AuthScheme {
	fn from(value: String) -> Self {
		match value.as_str() {
			"OAuth" => Self::OAuth,
			"Bearer" => Self::Bearer,
			_ => Self::Custom(value),
		}
	}
}
impl From<AuthScheme> for String {
	fn from(value: AuthScheme) -> Self {
		match value {
			AuthScheme::Custom(scheme) => scheme,
			other => other.as_str().to_owned(),
		}
	}
}
impl FromStr for AuthScheme {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::from(s.to_owned()))
	}
}
impl Display for AuthScheme {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Read-only settings for one remote endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
	/// Endpoint identifier; also keys the credential store.
	pub endpoint_id: EndpointId,
	/// Base URL the resource URIs are appended to.
	pub resource_url: Url,
	/// OAuth client identifier sent with refresh exchanges.
	pub client_id: String,
	/// Token endpoint used for the refresh-token grant.
	pub token_url: Url,
	/// Scheme used in the `Authorization` header.
	pub auth_scheme: AuthScheme,
}
impl EndpointConfig {
	/// Creates a new builder for the provided endpoint.
	pub fn builder(endpoint_id: EndpointId) -> EndpointConfigBuilder {
		EndpointConfigBuilder::new(endpoint_id)
	}

	/// Returns the `Authorization` header value for `token`.
	pub fn authorization(&self, token: &TokenSecret) -> String {
		self.auth_scheme.authorization(token)
	}

	/// Appends a resource URI onto the endpoint's base URL.
	///
	/// Absolute URIs are accepted only when they already live under `resource_url`. Any target
	/// outside the endpoint's origin is rejected so the session token never leaves it.
	pub fn resource_target(&self, uri: &str) -> Result<Url, CalloutError> {
		let invalid = || CalloutError::InvalidUri { uri: uri.to_owned() };
		let target = match Url::parse(uri) {
			Ok(absolute) => {
				let base = self.resource_url.as_str().trim_end_matches('/');
				let within = absolute.as_str().strip_prefix(base).is_some_and(|rest| {
					rest.is_empty() || rest.starts_with(['/', '?', '#'])
				});

				if !within {
					return Err(invalid());
				}

				absolute
			},
			Err(_) => {
				let base = self.resource_url.as_str().trim_end_matches('/');
				let joined = if uri.is_empty() {
					base.to_owned()
				} else if uri.starts_with('/') || uri.starts_with('?') {
					format!("{base}{uri}")
				} else {
					format!("{base}/{uri}")
				};

				Url::parse(&joined).map_err(|_| invalid())?
			},
		};

		if target.origin() != self.resource_url.origin() {
			return Err(invalid());
		}

		Ok(target)
	}
}
