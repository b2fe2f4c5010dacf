// Adapters layer: concrete implementations of the domain ports (http feed, stores, archives).

#[cfg(feature = "lambda")]
pub mod aws;
pub mod http;
pub mod local;
pub mod memory;
