//! Per-endpoint connector configuration (data) and the resolvers that look it up.
//!
//! `endpoint` holds the validated [`EndpointConfig`] consumed by each call together with the
//! [`AuthScheme`] written into the `Authorization` header. `builder` validates configs before
//! they reach the connector, and `resolver` defines [`ConfigResolver`] plus a static,
//! JSON-loadable implementation with connector-level fallbacks.

pub mod builder;
pub mod endpoint;
pub mod resolver;

pub use builder::*;
pub use endpoint::*;
pub use resolver::*;
