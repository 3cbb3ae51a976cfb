//! Core types and service wiring for the binday waste collection fetcher.

/// File-backed schedule cache and the caching fetcher decorator.
pub mod cache;
/// Domain models shared by all sources and downstream consumers.
pub mod model;
/// Registry for plugging council-specific sources into the service.
pub mod plugin;
/// Traits describing the source interface.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;

pub use cache::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
