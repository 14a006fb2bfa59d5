//! Connector-level error types shared across the executor, refresher, stores, and resolvers.

// self
use crate::{_prelude::*, auth::EndpointId, outcome::ErrorKind};

/// Connector-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical connector error raised while running the authenticated-call protocol.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error(transparent)]
	Storage(#[from] crate::store::StoreError),
	/// Endpoint configuration could not be resolved.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The refresh-token exchange failed.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// The protected resource could not be called.
	#[error(transparent)]
	Callout(#[from] CalloutError),

	/// Neither the caller nor the credential store holds an access token.
	#[error("No access token is present for endpoint `{endpoint}`.")]
	NoToken {
		/// Endpoint whose token was requested.
		endpoint: EndpointId,
	},
	/// The final response could not be copied to the caller.
	#[error("Failed to copy the response to the caller.")]
	CopyResponse(#[source] std::io::Error),
}
impl Error {
	/// Classifies the error into the machine-readable taxonomy surfaced to callers.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Storage(crate::store::StoreError::Unavailable { .. }) =>
				ErrorKind::CredentialStore,
			Self::Storage(_) | Self::Config(_) => ErrorKind::FetchCredentials,
			Self::Refresh(_) => ErrorKind::RefreshToken,
			Self::Callout(_) => ErrorKind::Callout,
			Self::NoToken { .. } => ErrorKind::NoToken,
			Self::CopyResponse(_) => ErrorKind::CopyResponse,
		}
	}
}

/// Configuration and endpoint resolution failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// No settings are registered for the endpoint.
	#[error("Endpoint `{endpoint}` is not configured.")]
	UnknownEndpoint {
		/// Endpoint identifier that failed to resolve.
		endpoint: String,
	},
	/// Neither the connector nor the caller's request path names an endpoint.
	#[error("Unable to determine the endpoint for resource `{uri}`.")]
	UnresolvedEndpoint {
		/// Resource URI being called.
		uri: String,
	},
	/// Endpoint identifier failed validation.
	#[error("Endpoint identifier is invalid.")]
	InvalidEndpointId(#[from] crate::auth::IdentifierError),
	/// Endpoint has no resource URL.
	#[error("Endpoint `{endpoint}` is missing a resource URL.")]
	MissingResourceUrl {
		/// Endpoint identifier.
		endpoint: String,
	},
	/// Endpoint has no OAuth client identifier.
	#[error("Endpoint `{endpoint}` is missing a client id.")]
	MissingClientId {
		/// Endpoint identifier.
		endpoint: String,
	},
	/// Endpoint has no token URL.
	#[error("Endpoint `{endpoint}` is missing an access token URL.")]
	MissingTokenUrl {
		/// Endpoint identifier.
		endpoint: String,
	},
	/// A configured URL uses a scheme other than http(s).
	#[error("The {field} URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which URL failed validation.
		field: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// Configuration document could not be parsed.
	#[error("Connector configuration is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures of the refresh-token grant exchange.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// The exchange request could not be assembled.
	#[error("Token refresh request could not be built.")]
	Request(#[from] oauth2::http::Error),
	/// The token endpoint could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The token endpoint answered successfully without a parseable `access_token`.
	#[error("Unable to retrieve access token from provider response.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}

/// Failures raised while calling the protected resource.
#[derive(Debug, ThisError)]
pub enum CalloutError {
	/// The resource URI cannot be joined onto the endpoint URL.
	#[error("Resource URI `{uri}` is invalid for this endpoint.")]
	InvalidUri {
		/// Resource URI supplied by the caller.
		uri: String,
	},
	/// The access token cannot be encoded as a header value.
	#[error("Authorization header value is invalid.")]
	InvalidAuthorization(#[from] oauth2::http::header::InvalidHeaderValue),
	/// The resource request could not be assembled.
	#[error("Resource request could not be built.")]
	Request(#[from] oauth2::http::Error),
	/// The transport failed while calling the resource.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The remote server did not answer in time.
	#[error("Request timed out while calling the remote server.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote server.")]
	Io(#[from] std::io::Error),
	/// The transport rejected the request before sending it.
	#[error("HTTP request is invalid.")]
	Request(#[from] oauth2::http::Error),
	/// Any other transport failure.
	#[error("HTTP client error occurred while calling the remote server: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
