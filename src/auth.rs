//! Session/endpoint identifiers and the token values the connector carries.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{pair::*, secret::*};
