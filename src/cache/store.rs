//! In-memory observable store.

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use tracing::trace;

use super::traits::Cacheable;

/// Ordered, observable collection of entities, unique by cache key.
///
/// Every mutation is applied to the shared snapshot before the call
/// returns, so the next value any subscriber sees already reflects it.
/// Subscribers receive whole snapshots rather than deltas; a subscriber that
/// falls behind only sees the latest state.
///
/// The store has no writer coordination of its own. It is meant to be owned
/// by a single repository that serialises its writes.
pub struct CacheStore<T: Cacheable> {
  tx: watch::Sender<Vec<T>>,
}

impl<T: Cacheable> Default for CacheStore<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Cacheable> CacheStore<T> {
  /// Create an empty store.
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(Vec::new());
    Self { tx }
  }

  /// Live stream of the full collection.
  ///
  /// Yields the current snapshot as soon as it is polled, then a new
  /// snapshot after every emitting mutation. The stream ends when the
  /// store is dropped.
  pub fn observe_all(&self) -> BoxStream<'static, Vec<T>> {
    snapshots(self.tx.subscribe())
  }

  /// Live stream of a single entity, `None` while it is absent.
  pub fn observe_by_id(&self, key: &str) -> BoxStream<'static, Option<T>> {
    let key = key.to_string();
    self
      .observe_all()
      .map(move |entries| entries.into_iter().find(|e| e.cache_key() == key))
      .boxed()
  }

  /// Current snapshot of the collection.
  pub fn snapshot(&self) -> Vec<T> {
    self.tx.borrow().clone()
  }

  /// Current version of the entity with the given key.
  pub fn get(&self, key: &str) -> Option<T> {
    self
      .tx
      .borrow()
      .iter()
      .find(|e| e.cache_key() == key)
      .cloned()
  }

  pub fn len(&self) -> usize {
    self.tx.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.tx.borrow().is_empty()
  }

  /// Insert entities, replacing existing ones that share a key.
  ///
  /// Replaced entities keep their position; new keys are appended in the
  /// order given. Always emits exactly once.
  pub fn insert_all(&self, incoming: Vec<T>) {
    let count = incoming.len();
    self.tx.send_modify(|entries| {
      for entity in incoming {
        upsert(entries, entity);
      }
    });
    trace!(entity = T::entity_type(), count, "cache insert_all");
  }

  /// Insert a single entity, replacing any existing version.
  pub fn insert(&self, entity: T) {
    self.insert_all(vec![entity]);
  }

  /// Replace the entity with a matching key.
  ///
  /// Returns the number of rows affected; a miss returns 0 and emits nothing.
  pub fn update(&self, entity: T) -> usize {
    let updated = self.tx.send_if_modified(move |entries| {
      match entries
        .iter_mut()
        .find(|e| e.cache_key() == entity.cache_key())
      {
        Some(slot) => {
          *slot = entity;
          true
        }
        None => false,
      }
    });
    usize::from(updated)
  }

  /// Remove the stored version of `entity`.
  pub fn delete(&self, entity: &T) -> usize {
    self.delete_by_id(entity.cache_key())
  }

  /// Remove the entity with the given key.
  ///
  /// Returns the number of rows affected; a miss returns 0 and emits nothing.
  pub fn delete_by_id(&self, key: &str) -> usize {
    let removed = self.tx.send_if_modified(|entries| {
      let before = entries.len();
      entries.retain(|e| e.cache_key() != key);
      entries.len() != before
    });
    usize::from(removed)
  }

  /// Remove everything. Emits even when the store was already empty.
  pub fn clear_all(&self) {
    self.tx.send_modify(|entries| entries.clear());
    trace!(entity = T::entity_type(), "cache cleared");
  }
}

fn upsert<T: Cacheable>(entries: &mut Vec<T>, entity: T) {
  match entries
    .iter_mut()
    .find(|e| e.cache_key() == entity.cache_key())
  {
    Some(slot) => *slot = entity,
    None => entries.push(entity),
  }
}

/// Turn a watch receiver into a stream that starts with the current value.
fn snapshots<T: Cacheable>(rx: watch::Receiver<Vec<T>>) -> BoxStream<'static, Vec<T>> {
  stream::unfold((rx, true), |(mut rx, first)| async move {
    if !first && rx.changed().await.is_err() {
      return None;
    }
    let snapshot = rx.borrow_and_update().clone();
    Some((snapshot, (rx, false)))
  })
  .boxed()
}
