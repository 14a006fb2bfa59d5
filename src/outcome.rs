//! Values returned to callers: a relayed response or a structured error.

// crates.io
use oauth2::http::header::CONTENT_TYPE;
use serde_json::{Value, json};
// self
use crate::{_prelude::*, executor::CallResult};

/// Machine-readable error identifiers surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// No access token is available; the user must re-authenticate.
	#[serde(rename = "NO_TOKEN")]
	NoToken,
	/// The refresh-token exchange failed.
	#[serde(rename = "ERR_REFRESH_TOKEN")]
	RefreshToken,
	/// The credential store cannot be reached.
	#[serde(rename = "ERR_CREDENTIALSTORE")]
	CredentialStore,
	/// Credentials (or their configuration) could not be retrieved.
	#[serde(rename = "ERR_FETCH_CREDENTIALS")]
	FetchCredentials,
	/// The final response could not be copied to the caller.
	#[serde(rename = "ERR_COPY_RESPONSE")]
	CopyResponse,
	/// The protected resource could not be called.
	#[serde(rename = "ERR_CALLOUT")]
	Callout,
}
impl ErrorKind {
	/// Returns the wire identifier.
	pub const fn id(self) -> &'static str {
		match self {
			Self::NoToken => "NO_TOKEN",
			Self::RefreshToken => "ERR_REFRESH_TOKEN",
			Self::CredentialStore => "ERR_CREDENTIALSTORE",
			Self::FetchCredentials => "ERR_FETCH_CREDENTIALS",
			Self::CopyResponse => "ERR_COPY_RESPONSE",
			Self::Callout => "ERR_CALLOUT",
		}
	}

	/// HTTP status written alongside the error payload.
	pub const fn status(self) -> StatusCode {
		match self {
			Self::NoToken => StatusCode::UNAUTHORIZED,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Human-readable message reported with the identifier.
	pub const fn message(self) -> &'static str {
		match self {
			Self::NoToken => "No access token is present",
			Self::RefreshToken => "Unable to refresh token",
			Self::CredentialStore => "Unable to load credential store",
			Self::FetchCredentials => "Unable to retrieve OAuth credentials from credential vault",
			Self::CopyResponse => "Error encountered copying response to the caller",
			Self::Callout => "Encountered error when calling the remote resource",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.id())
	}
}

/// Diagnostic details of the error that caused a [`StructuredError`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCause {
	/// Display form of the underlying error.
	pub message: String,
	/// Rendered `source()` chain, outermost first.
	#[serde(rename = "stackTrace")]
	pub trace: String,
}
impl ErrorCause {
	/// Captures the message and source chain of `error`.
	pub fn capture(error: &(dyn StdError + 'static)) -> Self {
		let mut trace = error.to_string();
		let mut source = error.source();

		while let Some(inner) = source {
			trace.push_str("\ncaused by: ");
			trace.push_str(&inner.to_string());

			source = inner.source();
		}

		Self { message: error.to_string(), trace }
	}
}

/// Error value returned instead of a relayed response.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{kind}: {message}")]
pub struct StructuredError {
	/// Machine-readable identifier.
	pub kind: ErrorKind,
	/// Human-readable message.
	pub message: String,
	/// Optional diagnostics; never required for correct behavior.
	pub cause: Option<ErrorCause>,
}
impl StructuredError {
	/// Creates an error carrying the kind's default message and no cause.
	pub fn new(kind: ErrorKind) -> Self {
		Self { kind, message: kind.message().to_owned(), cause: None }
	}

	/// Attaches diagnostics captured from `error`.
	pub fn with_cause(mut self, error: &(dyn StdError + 'static)) -> Self {
		self.cause = Some(ErrorCause::capture(error));

		self
	}

	/// HTTP status written alongside the payload.
	pub fn status(&self) -> StatusCode {
		self.kind.status()
	}

	/// Renders the JSON payload
	/// `{"error":{"id":..,"message":..,"exception":{"message":..,"stackTrace":..}}}`.
	pub fn to_json(&self) -> Value {
		let mut error = json!({ "id": self.kind.id(), "message": self.message });

		if let (Some(cause), Some(object)) = (&self.cause, error.as_object_mut()) {
			object.insert(
				"exception".into(),
				json!({ "message": cause.message, "stackTrace": cause.trace }),
			);
		}

		json!({ "error": error })
	}

	/// Renders the error as a response the caller can relay verbatim.
	pub fn to_call_result(&self) -> CallResult {
		let mut result = CallResult::new(self.status(), self.to_json().to_string());

		result.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		result
	}
}
impl From<Error> for StructuredError {
	fn from(error: Error) -> Self {
		let kind = error.kind();

		match error {
			Error::NoToken { .. } => Self::new(kind),
			other => Self::new(kind).with_cause(&other),
		}
	}
}

/// Final value of a connector call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
	/// Response of the last attempt, relayed verbatim.
	Relayed(CallResult),
	/// Structured error surfaced instead of a response.
	Failed(StructuredError),
}
impl CallOutcome {
	/// Status the caller will observe.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Relayed(result) => result.status,
			Self::Failed(error) => error.status(),
		}
	}

	/// Returns the relayed response, if any.
	pub fn relayed(&self) -> Option<&CallResult> {
		match self {
			Self::Relayed(result) => Some(result),
			Self::Failed(_) => None,
		}
	}

	/// Returns the structured error, if any.
	pub fn error(&self) -> Option<&StructuredError> {
		match self {
			Self::Relayed(_) => None,
			Self::Failed(error) => Some(error),
		}
	}

	/// Converts the outcome into the response written to the caller.
	pub fn into_call_result(self) -> CallResult {
		match self {
			Self::Relayed(result) => result,
			Self::Failed(error) => error.to_call_result(),
		}
	}
}
impl From<Result<CallResult>> for CallOutcome {
	fn from(result: Result<CallResult>) -> Self {
		match result {
			Ok(result) => Self::Relayed(result),
			Err(error) => Self::Failed(error.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::EndpointId,
		error::{RefreshError, TransportError},
	};

	#[test]
	fn kinds_carry_wire_ids_and_statuses() {
		assert_eq!(ErrorKind::NoToken.id(), "NO_TOKEN");
		assert_eq!(ErrorKind::NoToken.status(), StatusCode::UNAUTHORIZED);

		for kind in [
			ErrorKind::RefreshToken,
			ErrorKind::CredentialStore,
			ErrorKind::FetchCredentials,
			ErrorKind::CopyResponse,
			ErrorKind::Callout,
		] {
			assert_eq!(kind.status(), StatusCode::INTERNAL_SERVER_ERROR, "{kind}");
		}
		assert_eq!(
			serde_json::to_string(&ErrorKind::CredentialStore).expect("Kind should serialize."),
			"\"ERR_CREDENTIALSTORE\""
		);
	}

	#[test]
	fn no_token_payload_omits_exception() {
		let error = StructuredError::from(Error::NoToken {
			endpoint: EndpointId::new("twitter").expect("Endpoint id should be valid."),
		});

		assert_eq!(
			error.to_json(),
			json!({ "error": { "id": "NO_TOKEN", "message": "No access token is present" } })
		);
	}

	#[test]
	fn refresh_payload_includes_cause_chain() {
		let error = StructuredError::from(Error::from(RefreshError::Transport(
			TransportError::Io(std::io::Error::other("connection reset")),
		)));
		let payload = error.to_json();

		assert_eq!(payload["error"]["id"], "ERR_REFRESH_TOKEN");
		assert_eq!(payload["error"]["message"], "Unable to refresh token");
		assert!(
			payload["error"]["exception"]["stackTrace"]
				.as_str()
				.expect("Stack trace should be a string.")
				.contains("caused by: connection reset")
		);
	}

	#[test]
	fn failed_outcome_renders_json_response() {
		let result =
			CallOutcome::Failed(StructuredError::new(ErrorKind::Callout)).into_call_result();

		assert_eq!(result.status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(result.headers[CONTENT_TYPE], "application/json");

		let body: Value = serde_json::from_slice(&result.body).expect("Body should be JSON.");

		assert_eq!(body["error"]["id"], "ERR_CALLOUT");
	}
}
