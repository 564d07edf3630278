//! Time-boxed in-memory caches.
//!
//! # Key types
//!
//! - [`TtlCache`]: a bounded map whose entries expire. Reads past expiry
//!   are misses and remove the entry. When full, the oldest-inserted
//!   entry is evicted.
//! - [`SharedCache`]: a `TtlCache` behind its own mutex, shareable
//!   across tasks with `Arc`.
//! - [`CacheConfig`]: TTL and size bound, with presets for the three
//!   session caches.
//! - [`spawn_sweeper`]: a background task that purges expired entries
//!   on a fixed interval, independent of reads.

mod config;
mod shared;
mod sweeper;
mod ttl;

pub use config::CacheConfig;
pub use shared::SharedCache;
pub use sweeper::{Sweep, SweeperHandle, spawn_sweeper};
pub use ttl::TtlCache;
