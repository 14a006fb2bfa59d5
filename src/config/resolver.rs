//! Endpoint configuration lookup.

// self
use crate::{
	_prelude::*,
	auth::EndpointId,
	config::{AuthScheme, EndpointConfig},
	error::ConfigError,
};

const PROXY_PREFIX: &str = "/proxy/";

/// Read-only source of [`EndpointConfig`] values.
pub trait ConfigResolver
where
	Self: Send + Sync,
{
	/// Resolves the configuration for `endpoint`, failing when it is unknown.
	fn resolve(&self, endpoint: &EndpointId) -> Result<EndpointConfig, ConfigError>;
}

/// Partially specified endpoint settings; unset fields fall back to connector defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EndpointSettings {
	/// Base URL of the protected resource.
	#[serde(default, alias = "endpoint-url")]
	pub resource_url: Option<Url>,
	/// OAuth client identifier.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Token endpoint for refresh exchanges.
	#[serde(default, alias = "access-token-url")]
	pub token_url: Option<Url>,
	/// `Authorization` header scheme.
	#[serde(default, alias = "auth-method")]
	pub auth_scheme: Option<AuthScheme>,
}
impl EndpointSettings {
	/// Sets the resource base URL.
	pub fn resource_url(mut self, url: Url) -> Self {
		self.resource_url = Some(url);

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Sets the header scheme.
	pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
		self.auth_scheme = Some(scheme);

		self
	}
}

/// In-memory resolver holding connector defaults plus per-endpoint overrides.
///
/// Each field resolves from the endpoint first and from the connector defaults second, so a
/// single client id or token URL can serve several endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfigResolver {
	/// Connector-level defaults.
	#[serde(default)]
	pub defaults: EndpointSettings,
	/// Registered endpoints.
	#[serde(default)]
	pub endpoints: HashMap<EndpointId, EndpointSettings>,
}
impl StaticConfigResolver {
	/// Creates a resolver with the provided connector defaults.
	pub fn new(defaults: EndpointSettings) -> Self {
		Self { defaults, endpoints: HashMap::new() }
	}

	/// Registers (or replaces) the settings for an endpoint.
	pub fn with_endpoint(mut self, endpoint: EndpointId, settings: EndpointSettings) -> Self {
		self.endpoints.insert(endpoint, settings);

		self
	}

	/// Parses a resolver from a JSON document.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de).map_err(|source| ConfigError::Parse { source })
	}
}
impl ConfigResolver for StaticConfigResolver {
	fn resolve(&self, endpoint: &EndpointId) -> Result<EndpointConfig, ConfigError> {
		let settings = self
			.endpoints
			.get(endpoint)
			.ok_or_else(|| ConfigError::UnknownEndpoint { endpoint: endpoint.to_string() })?;
		let defaults = &self.defaults;
		let mut builder = EndpointConfig::builder(endpoint.clone());

		if let Some(url) = settings.resource_url.as_ref().or(defaults.resource_url.as_ref()) {
			builder = builder.resource_url(url.clone());
		}
		if let Some(client_id) = settings.client_id.as_ref().or(defaults.client_id.as_ref()) {
			builder = builder.client_id(client_id.clone());
		}
		if let Some(url) = settings.token_url.as_ref().or(defaults.token_url.as_ref()) {
			builder = builder.token_url(url.clone());
		}
		if let Some(scheme) = settings.auth_scheme.as_ref().or(defaults.auth_scheme.as_ref()) {
			builder = builder.auth_scheme(scheme.clone());
		}

		builder.build()
	}
}

/// Picks the endpoint for a call: the configured token source wins, otherwise the id is derived
/// from the caller's request path by removing the resource URI and the `/proxy/` prefix.
///
/// The derivation assumes `<prefix>/proxy/<endpoint><uri>` request paths and is not reliable for
/// nested proxy routes.
pub fn select_endpoint(
	configured: Option<&EndpointId>,
	uri: &str,
	request_path: Option<&str>,
) -> Result<EndpointId, ConfigError> {
	if let Some(endpoint) = configured {
		return Ok(endpoint.clone());
	}

	let path = request_path.ok_or_else(|| ConfigError::UnresolvedEndpoint { uri: uri.into() })?;

	derive_endpoint_id(uri, path)
}

/// Derives an endpoint id from a proxied request path such as `/share/proxy/twitter/1.1/x`.
pub fn derive_endpoint_id(uri: &str, request_path: &str) -> Result<EndpointId, ConfigError> {
	let mut derived = request_path.to_owned();

	if !uri.is_empty() {
		derived = derived.replace(uri, "");
	}

	derived.push('/');

	let derived = match derived.rfind(PROXY_PREFIX) {
		Some(idx) => &derived[idx + PROXY_PREFIX.len()..],
		None => derived.as_str(),
	};
	let derived = derived.trim_matches('/');

	if derived.is_empty() {
		return Err(ConfigError::UnresolvedEndpoint { uri: uri.into() });
	}

	Ok(EndpointId::new(derived)?)
}
