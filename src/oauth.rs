//! Transport error mapping and the `oauth2` HTTP types the connector speaks.
//!
//! Both outbound paths (resource calls and refresh exchanges) go through
//! [`oauth2::AsyncHttpClient`] handles, so any transport that implements
//! [`ConnectorHttpClient`](crate::http::ConnectorHttpClient) only needs a
//! [`TransportErrorMapper`] to integrate with the connector's error taxonomy.

pub use oauth2;

// crates.io
use oauth2::HttpClientError;
// self
use crate::{_prelude::*, error::TransportError, http::ResponseMetadata};

/// Maps HTTP transport failures into connector [`TransportError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a connector error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> TransportError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> TransportError {
		match err {
			HttpClientError::Reqwest(inner) => TransportError::from(*inner),
			HttpClientError::Http(inner) => TransportError::Request(inner),
			HttpClientError::Io(inner) => TransportError::Io(inner),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unrecognized transport failure"),
		}
	}
}

/// Builds a [`TransportError::Other`] that mentions the HTTP status when one was received.
pub fn map_generic_transport_error(
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> TransportError {
	let message = match meta.and_then(|value| value.status) {
		Some(status) => format!("{message} (HTTP {status})"),
		None => message.to_string(),
	};

	TransportError::Other { message }
}
