//! Single authenticated call against the protected resource.
//!
//! [`RequestExecutor`] is the seam the connector drives up to three times per call. The
//! executor always returns a fully buffered [`CallResult`] so the connector can discard an
//! attempt before anything reaches the caller.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::header::{AUTHORIZATION, HeaderName},
};
// self
use crate::{
	_prelude::*,
	config::EndpointConfig,
	error::CalloutError,
	http::{ConnectorHttpClient, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Boxed future returned by [`RequestExecutor::perform`].
pub type ExecutorFuture<'a> =
	Pin<Box<dyn Future<Output = Result<CallResult, CalloutError>> + 'a + Send>>;

/// Immutable description of the request to replay against the resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundCall {
	/// Resource URI, relative to the endpoint's resource URL (or absolute).
	pub uri: String,
	/// HTTP method.
	pub method: Method,
	/// Caller headers forwarded as-is; any `Authorization` header is replaced.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl OutboundCall {
	/// Creates a call without headers or body.
	pub fn new(method: Method, uri: impl Into<String>) -> Self {
		Self { uri: uri.into(), method, headers: HeaderMap::new(), body: None }
	}

	/// Convenience constructor for `GET` calls.
	pub fn get(uri: impl Into<String>) -> Self {
		Self::new(Method::GET, uri)
	}

	/// Appends a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.append(name, value);

		self
	}

	/// Sets the request body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}
}

/// Fully materialized response of one executor invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallResult {
	/// Response status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body.
	pub body: Vec<u8>,
}
impl CallResult {
	/// Creates a result with an empty header map.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Returns `true` for the statuses that trigger a token reload (401 and 403).
	pub fn is_auth_failure(&self) -> bool {
		matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
	}
}

/// Performs one outbound call with the provided `Authorization` header value.
pub trait RequestExecutor
where
	Self: Send + Sync,
{
	/// Sends `call` to the endpoint's resource with `authorization` attached.
	///
	/// Implementations report every failure through [`CalloutError`] instead of panicking so a
	/// downstream outage never takes the connector down.
	fn perform<'a>(
		&'a self,
		endpoint: &'a EndpointConfig,
		call: &'a OutboundCall,
		authorization: &'a str,
	) -> ExecutorFuture<'a>;
}

/// [`RequestExecutor`] backed by a [`ConnectorHttpClient`].
pub struct HttpRequestExecutor<C, M>
where
	C: ?Sized + ConnectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> HttpRequestExecutor<C, M>
where
	C: ?Sized + ConnectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an executor over the transport + mapper pair.
	pub fn new(http_client: impl Into<Arc<C>>, error_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), error_mapper: error_mapper.into() }
	}
}
#[cfg(feature = "reqwest")]
impl Default for HttpRequestExecutor<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> RequestExecutor for HttpRequestExecutor<C, M>
where
	C: ?Sized + ConnectorHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn perform<'a>(
		&'a self,
		endpoint: &'a EndpointConfig,
		call: &'a OutboundCall,
		authorization: &'a str,
	) -> ExecutorFuture<'a> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let request = build_request(endpoint, call, authorization)?;
			let handle = self.http_client.with_metadata(meta.clone());
			let response = handle.call(request).await.map_err(|err| {
				CalloutError::from(self.error_mapper.map_transport_error(meta.take().as_ref(), err))
			})?;
			let (parts, body) = response.into_parts();

			Ok(CallResult { status: parts.status, headers: parts.headers, body })
		})
	}
}

fn build_request(
	endpoint: &EndpointConfig,
	call: &OutboundCall,
	authorization: &str,
) -> Result<HttpRequest, CalloutError> {
	let target = endpoint.resource_target(&call.uri)?;
	let mut value = HeaderValue::from_str(authorization)?;

	value.set_sensitive(true);

	let mut request = oauth2::http::Request::builder()
		.method(call.method.clone())
		.uri(target.as_str())
		.body(call.body.clone().unwrap_or_default())?;

	*request.headers_mut() = call.headers.clone();
	request.headers_mut().insert(AUTHORIZATION, value);

	Ok(request)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::EndpointId;
	use oauth2::http::header::{ACCEPT, CONTENT_TYPE};

	fn endpoint() -> EndpointConfig {
		EndpointConfig::builder(EndpointId::new("yammer").expect("Endpoint id should be valid."))
			.resource_url(Url::parse("https://www.yammer.com/api/v1").expect("URL should parse."))
			.client_id("client")
			.token_url(
				Url::parse("https://www.yammer.com/oauth2/token").expect("URL should parse."),
			)
			.build()
			.expect("Endpoint config should build.")
	}

	#[test]
	fn request_replaces_caller_authorization_and_keeps_other_headers() {
		let call = OutboundCall::new(Method::POST, "/messages.json")
			.with_header(AUTHORIZATION, HeaderValue::from_static("Basic stale"))
			.with_header(ACCEPT, HeaderValue::from_static("application/json"))
			.with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
			.with_body("hello");
		let request =
			build_request(&endpoint(), &call, "OAuth T1").expect("Request should be built.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri().to_string(), "https://www.yammer.com/api/v1/messages.json");
		assert_eq!(request.headers().get_all(AUTHORIZATION).iter().count(), 1);
		assert_eq!(request.headers()[AUTHORIZATION], "OAuth T1");
		assert!(request.headers()[AUTHORIZATION].is_sensitive());
		assert_eq!(request.headers()[ACCEPT], "application/json");
		assert_eq!(request.body().as_slice(), b"hello");
	}

	#[test]
	fn invalid_authorization_values_are_callout_errors() {
		let err = build_request(&endpoint(), &OutboundCall::get("/me"), "OAuth bad\ntoken")
			.expect_err("Newlines are not valid in header values.");

		assert!(matches!(err, CalloutError::InvalidAuthorization(_)));
	}

	#[test]
	fn foreign_targets_are_rejected_before_a_request_exists() {
		let call = OutboundCall::get("https://attacker.example.com/steal");
		let err = build_request(&endpoint(), &call, "OAuth T1")
			.expect_err("Targets outside the endpoint must be rejected.");

		assert!(matches!(
			err,
			CalloutError::InvalidUri { uri } if uri == "https://attacker.example.com/steal"
		));
	}

	#[test]
	fn auth_failures_cover_401_and_403_only() {
		assert!(CallResult::new(StatusCode::UNAUTHORIZED, "").is_auth_failure());
		assert!(CallResult::new(StatusCode::FORBIDDEN, "").is_auth_failure());
		assert!(!CallResult::new(StatusCode::NOT_FOUND, "").is_auth_failure());
		assert!(!CallResult::new(StatusCode::INTERNAL_SERVER_ERROR, "").is_auth_failure());
	}
}
