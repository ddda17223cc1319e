//! Core traits for the caching system.

/// Trait for entities that can live in a [`CacheStore`](super::CacheStore).
///
/// Implementors must provide a unique cache key. Two values with the same
/// key are considered versions of the same entity.
pub trait Cacheable: Clone + Send + Sync + 'static {
  /// Unique identifier for this entity (e.g., item id)
  fn cache_key(&self) -> &str;

  /// Entity type name used in log output (e.g., "item")
  fn entity_type() -> &'static str;
}
