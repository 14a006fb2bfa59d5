//! Token secrets and the access/refresh pair cached per session and endpoint.

pub mod pair;
pub mod secret;
