//! Caching: the shared in-memory store and the opportunistic tee.

pub mod sink;
pub mod store;

pub use sink::CacheSink;
pub use store::MemoryCacheStore;
