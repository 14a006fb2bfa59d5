//! Copies the connector's final outcome onto the caller-facing response.
//!
//! Attempts are buffered by the executor, so nothing touches a [`ResponseSink`] until the
//! connector has settled on its final result.

// std
use std::io;
// crates.io
use oauth2::http::header::{CONTENT_TYPE, HeaderName};
// self
use crate::{
	_prelude::*,
	executor::CallResult,
	obs,
	outcome::{CallOutcome, StructuredError},
};

/// Caller-facing response the final outcome is written to.
pub trait ResponseSink {
	/// Sets the response status.
	fn set_status(&mut self, status: StatusCode);

	/// Sets (replaces) a response header.
	fn set_header(&mut self, name: &HeaderName, value: &HeaderValue);

	/// Adds another value for a response header.
	fn append_header(&mut self, name: &HeaderName, value: &HeaderValue);

	/// Drops every header set so far.
	fn clear_headers(&mut self);

	/// Writes body bytes.
	fn write_body(&mut self, body: &[u8]) -> io::Result<()>;

	/// Flushes anything buffered so far.
	fn flush(&mut self) -> io::Result<()>;
}

/// In-memory [`ResponseSink`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferedResponse {
	/// Status written so far, if any.
	pub status: Option<StatusCode>,
	/// Headers written so far.
	pub headers: HeaderMap,
	/// Body written so far.
	pub body: Vec<u8>,
	/// Whether [`ResponseSink::flush`] has been called.
	pub flushed: bool,
}
impl BufferedResponse {
	/// Converts the buffered state into a [`CallResult`], defaulting the status to 200.
	pub fn into_call_result(self) -> CallResult {
		CallResult {
			status: self.status.unwrap_or(StatusCode::OK),
			headers: self.headers,
			body: self.body,
		}
	}
}
impl ResponseSink for BufferedResponse {
	fn set_status(&mut self, status: StatusCode) {
		self.status = Some(status);
	}

	fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
		self.headers.insert(name.clone(), value.clone());
	}

	fn append_header(&mut self, name: &HeaderName, value: &HeaderValue) {
		self.headers.append(name.clone(), value.clone());
	}

	fn clear_headers(&mut self) {
		self.headers.clear();
	}

	fn write_body(&mut self, body: &[u8]) -> io::Result<()> {
		self.body.extend_from_slice(body);

		Ok(())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.flushed = true;

		Ok(())
	}
}

/// Writes `outcome` to `sink`.
///
/// A relayed response is copied status, headers, then body. If copying fails, an
/// `ERR_COPY_RESPONSE` payload is written on a best-effort basis and returned. Structured errors
/// are written as their JSON payload and returned as well.
pub fn relay(outcome: CallOutcome, sink: &mut dyn ResponseSink) -> Result<(), StructuredError> {
	match outcome {
		CallOutcome::Relayed(result) => copy_result(&result, sink).map_err(|err| {
			let error = StructuredError::from(Error::CopyResponse(err));

			write_error(&error, sink);

			error
		}),
		CallOutcome::Failed(error) => {
			write_error(&error, sink);

			Err(error)
		},
	}
}

fn copy_result(result: &CallResult, sink: &mut dyn ResponseSink) -> io::Result<()> {
	sink.set_status(result.status);

	for name in result.headers.keys() {
		let mut values = result.headers.get_all(name).iter();

		if let Some(first) = values.next() {
			sink.set_header(name, first);
		}
		for value in values {
			sink.append_header(name, value);
		}
	}

	sink.write_body(&result.body)?;
	sink.flush()
}

fn write_error(error: &StructuredError, sink: &mut dyn ResponseSink) {
	let payload = error.to_json().to_string();

	sink.set_status(error.status());
	sink.clear_headers();
	sink.set_header(&CONTENT_TYPE, &HeaderValue::from_static("application/json"));

	if let Err(err) = sink.write_body(payload.as_bytes()).and_then(|_| sink.flush()) {
		obs::trace_relay_failure(&err);
	}
}
