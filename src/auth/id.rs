//! Identifiers that scope every stored token.
//!
//! A token pair is keyed by the session that obtained it and the endpoint it authorizes. Session
//! ids are opaque values handed over by the hosting application (user names, e-mail addresses,
//! ticket ids). Endpoint ids name configured endpoints and are also derived from the
//! `/proxy/<endpoint>/...` segment of a caller's request path, so they must stay a single,
//! printable path segment.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Which identifier failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IdKind {
	/// [`SessionId`].
	Session,
	/// [`EndpointId`].
	Endpoint,
}
impl IdKind {
	const fn max_len(self) -> usize {
		match self {
			Self::Session => 256,
			Self::Endpoint => 128,
		}
	}

	fn check(self, view: &str) -> Result<(), IdentifierError> {
		if view.trim().is_empty() {
			return Err(IdentifierError::Empty { kind: self });
		}

		let max = self.max_len();

		if view.chars().count() > max {
			return Err(IdentifierError::TooLong { kind: self, max });
		}

		let rejected = view.chars().find(|c| match self {
			Self::Session => c.is_whitespace() || c.is_control(),
			Self::Endpoint => c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#'),
		});

		match rejected {
			Some(character) => Err(IdentifierError::InvalidCharacter { kind: self, character }),
			None => Ok(()),
		}
	}
}
impl Display for IdKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Self::Session => "Session",
			Self::Endpoint => "Endpoint",
		})
	}
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or blank.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Identifier being validated.
		kind: IdKind,
	},
	/// The identifier contains a character its kind does not allow.
	#[error("{kind} identifier contains the disallowed character {character:?}.")]
	InvalidCharacter {
		/// Identifier being validated.
		kind: IdKind,
		/// First offending character.
		character: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Identifier being validated.
		kind: IdKind,
		/// Maximum permitted character count.
		max: usize,
	},
}

macro_rules! scoped_id {
	($(#[$meta:meta])* $name:ident => $kind:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				$kind.check(&value)?;

				Ok(Self(value))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

scoped_id! {
	/// Session that owns a set of tokens.
	///
	/// Any printable value without whitespace is accepted.
	SessionId => IdKind::Session
}
scoped_id! {
	/// Configured remote endpoint; one path segment such as `twitter` or `yammer`.
	EndpointId => IdKind::Endpoint
}
