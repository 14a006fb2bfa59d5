//! Validation of endpoint settings into an [`EndpointConfig`].

// self
use crate::{
	_prelude::*,
	auth::EndpointId,
	config::{AuthScheme, EndpointConfig},
	error::ConfigError,
};

/// Builder for [`EndpointConfig`] values.
#[derive(Debug)]
pub struct EndpointConfigBuilder {
	/// Identifier for the endpoint being configured.
	pub endpoint_id: EndpointId,
	/// Base URL of the protected resource.
	pub resource_url: Option<Url>,
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// Token endpoint used for refresh exchanges.
	pub token_url: Option<Url>,
	/// Header scheme; defaults to [`AuthScheme::OAuth`].
	pub auth_scheme: AuthScheme,
}
impl EndpointConfigBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(endpoint_id: EndpointId) -> Self {
		Self {
			endpoint_id,
			resource_url: None,
			client_id: None,
			token_url: None,
			auth_scheme: AuthScheme::default(),
		}
	}

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

	/// Overrides the `Authorization` header scheme.
	pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
		self.auth_scheme = scheme;

		self
	}

	/// Validates and returns the endpoint configuration.
	pub fn build(self) -> Result<EndpointConfig, ConfigError> {
		let endpoint = self.endpoint_id.to_string();
		let resource_url = self
			.resource_url
			.ok_or_else(|| ConfigError::MissingResourceUrl { endpoint: endpoint.clone() })?;
		let client_id = self
			.client_id
			.filter(|value| !value.trim().is_empty())
			.ok_or_else(|| ConfigError::MissingClientId { endpoint: endpoint.clone() })?;
		let token_url = self.token_url.ok_or(ConfigError::MissingTokenUrl { endpoint })?;

		validate_http("resource", &resource_url)?;
		validate_http("token", &token_url)?;

		Ok(EndpointConfig {
			endpoint_id: self.endpoint_id,
			resource_url,
			client_id,
			token_url,
			auth_scheme: self.auth_scheme,
		})
	}
}

fn validate_http(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ConfigError::UnsupportedScheme { field, url: url.to_string() }),
	}
}
