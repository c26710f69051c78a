//! In-memory query cache keyed by `(query, entity types, strategy, parent id, filters)`.
//!
//! Reads inside the freshness window are hits; older entries read as misses
//! and are dropped once they pass the eviction window. Concurrent lookups for
//! one key share a single in-flight fetch. Values are replaced whole, never
//! edited in place.

pub mod key;
pub mod store;

pub use key::CacheKey;
pub use store::{CacheEntry, CacheStats, Cacheable, QueryCache};
