//! Refresh-token grant exchange.
//!
//! [`TokenRefresher::refresh`] POSTs `grant_type=refresh_token`, `refresh_token`, and
//! `client_id` to the endpoint's token URL and distinguishes three results:
//!
//! - `Ok(Some(token))`: the provider issued an access token.
//! - `Ok(None)`: the provider answered with a non-success status (it rejected the refresh).
//! - `Err(_)`: the exchange itself failed, either in transport or because a success response
//!   did not carry a parseable `access_token`.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::header::{ACCEPT, CONTENT_TYPE},
};
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::RefreshError,
	http::{ConnectorHttpClient, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Boxed future returned by [`TokenRefresher::refresh`].
pub type RefreshFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Option<TokenSecret>, RefreshError>> + 'a + Send>>;

/// Exchanges a refresh token for a new access token.
pub trait TokenRefresher
where
	Self: Send + Sync,
{
	/// Performs one grant exchange against `token_url`.
	fn refresh<'a>(
		&'a self,
		refresh_token: &'a TokenSecret,
		client_id: &'a str,
		token_url: &'a Url,
	) -> RefreshFuture<'a>;
}

/// [`TokenRefresher`] backed by a [`ConnectorHttpClient`].
pub struct HttpTokenRefresher<C, M>
where
	C: ?Sized + ConnectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> HttpTokenRefresher<C, M>
where
	C: ?Sized + ConnectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a refresher over the transport + mapper pair.
	pub fn new(http_client: impl Into<Arc<C>>, error_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), error_mapper: error_mapper.into() }
	}
}
#[cfg(feature = "reqwest")]
impl Default for HttpTokenRefresher<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> TokenRefresher for HttpTokenRefresher<C, M>
where
	C: ?Sized + ConnectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn refresh<'a>(
		&'a self,
		refresh_token: &'a TokenSecret,
		client_id: &'a str,
		token_url: &'a Url,
	) -> RefreshFuture<'a> {
		let meta = ResponseMetadataSlot::default();
		let span = FlowSpan::new(FlowKind::Refresh, "grant_exchange");

		Box::pin(span.instrument(async move {
			let request = build_refresh_request(refresh_token, client_id, token_url)?;
			let handle = self.http_client.with_metadata(meta.clone());
			let response = handle.call(request).await.map_err(|err| {
				RefreshError::from(self.error_mapper.map_transport_error(meta.take().as_ref(), err))
			})?;
			let status = response.status();

			if !status.is_success() {
				crate::obs::trace_refresh_rejected(status.as_u16());

				return Ok(None);
			}

			parse_access_token(status.as_u16(), response.body())
		}))
	}
}

#[derive(Deserialize)]
struct RefreshResponse {
	access_token: String,
}

fn build_refresh_request(
	refresh_token: &TokenSecret,
	client_id: &str,
	token_url: &Url,
) -> Result<HttpRequest, RefreshError> {
	let form = FormSerializer::new(String::new())
		.append_pair("grant_type", "refresh_token")
		.append_pair("refresh_token", refresh_token.expose())
		.append_pair("client_id", client_id)
		.finish();
	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(token_url.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.body(form.into_bytes())?;

	Ok(request)
}

fn parse_access_token(status: u16, body: &[u8]) -> Result<Option<TokenSecret>, RefreshError> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let payload: RefreshResponse = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| RefreshError::Parse { source, status })?;

	if payload.access_token.is_empty() {
		return Ok(None);
	}

	Ok(Some(TokenSecret::new(payload.access_token)))
}
