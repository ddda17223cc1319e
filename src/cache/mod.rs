//! Generic observable cache for locally held entities.
//!
//! This module provides a domain-agnostic in-memory store that:
//! - Keeps entities in insertion order, unique by cache key
//! - Publishes a fresh snapshot to every subscriber after each mutation
//! - Reports "rows affected" for updates and deletes instead of failing on misses

mod store;
mod traits;

pub use store::CacheStore;
pub use traits::Cacheable;
