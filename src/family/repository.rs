//! Cache-first repository for the shared shopping list.
//!
//! Reads are served from the local [`CacheStore`] and refreshed from the
//! remote in the background. Writes are applied to the cache first, then
//! sent to the remote; failed updates are rolled back to the previous
//! cached version. Remote failures are reported as a [`SyncOutcome`] and
//! never surface as errors.

use chrono::Utc;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{RemoteError, ValidationError};
use super::remote::{Notifier, RemoteStore};
use super::types::{completed_sorted, Item, NewItem, Priority};
use crate::cache::CacheStore;

/// What happened to the remote side of a local mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The remote confirmed the change
  Synced,
  /// The local change stands but the remote does not have it
  Pending { reason: String },
  /// The remote refused and the cache was restored
  RolledBack { reason: String },
  /// Nothing with that id is cached
  NotFound,
}

impl SyncOutcome {
  pub fn is_synced(&self) -> bool {
    matches!(self, SyncOutcome::Synced)
  }

  /// User-facing description of a non-synced outcome.
  pub fn problem(&self) -> Option<String> {
    match self {
      SyncOutcome::Synced => None,
      SyncOutcome::Pending { reason } => Some(format!("not synced yet: {}", reason)),
      SyncOutcome::RolledBack { reason } => Some(format!("change undone: {}", reason)),
      SyncOutcome::NotFound => Some("item not found".to_string()),
    }
  }
}

/// Result of [`SyncRepository::add_item`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Added {
  /// The cached item, carrying the server id once synced
  pub item: Item,
  pub outcome: SyncOutcome,
}

/// Result of [`SyncRepository::clear_completed_from_active_list`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
  pub archived: usize,
  pub failed: usize,
}

/// Mediates between the local cache and the remote store.
///
/// Cloning is cheap; clones share the same cache and backends.
#[derive(Clone)]
pub struct SyncRepository {
  cache: Arc<CacheStore<Item>>,
  remote: Arc<dyn RemoteStore>,
  notifier: Arc<dyn Notifier>,
  /// Finished refresh attempts, successful or not
  refreshes: Arc<watch::Sender<u64>>,
}

impl SyncRepository {
  pub fn new(remote: Arc<dyn RemoteStore>, notifier: Arc<dyn Notifier>) -> Self {
    let (refreshes, _) = watch::channel(0);
    Self {
      cache: Arc::new(CacheStore::new()),
      remote,
      notifier,
      refreshes: Arc::new(refreshes),
    }
  }

  /// Live list for a family.
  ///
  /// Yields the cached snapshot immediately. The first poll also starts a
  /// refresh from the remote, which replaces the cache when it succeeds.
  /// Dropping the stream cancels a refresh still in flight.
  pub fn get_list(&self, family_id: &str) -> BoxStream<'static, Vec<Item>> {
    let repo = self.clone();
    let family_id = family_id.to_string();
    let refresh = stream::once(async move {
      if let Err(e) = repo.refresh(&family_id).await {
        warn!(%family_id, error = %e, "background refresh failed, keeping cached list");
      }
    })
    .filter_map(|_| future::ready(None::<Vec<Item>>));

    // Refresh goes first so the fetch starts on the very first poll.
    stream::select(refresh, self.cache.observe_all()).boxed()
  }

  /// `get_list` without archived items.
  pub fn get_active_list(&self, family_id: &str) -> BoxStream<'static, Vec<Item>> {
    self
      .get_list(family_id)
      .map(|items| items.into_iter().filter(|i| !i.archived).collect())
      .boxed()
  }

  /// Completed items, most recently completed first.
  pub fn get_completed_items(&self, family_id: &str) -> BoxStream<'static, Vec<Item>> {
    debug!(family_id, "observing completed items");
    self.cache.observe_all().map(completed_sorted).boxed()
  }

  /// Fetch the remote list and replace the cache with it.
  ///
  /// Returns the number of items fetched. The cache is untouched on error.
  pub async fn refresh(&self, family_id: &str) -> Result<usize, RemoteError> {
    if family_id.trim().is_empty() {
      return Err(ValidationError::MissingFamily.into());
    }
    let fetched = self.remote.fetch_list(family_id).await;
    let result = fetched.map(|items| {
      let items: Vec<Item> = items.into_iter().map(Item::normalized).collect();
      let count = items.len();

      // Local edits made while the fetch was in flight are overwritten.
      self.cache.clear_all();
      self.cache.insert_all(items);
      info!(family_id, count, "list refreshed from remote");
      count
    });
    self.refreshes.send_modify(|n| *n += 1);
    result
  }

  /// Add an item optimistically.
  ///
  /// The item is cached under a temporary id right away. Once the remote
  /// creates it, the temporary entry is swapped for the remote one with the
  /// local descriptive fields kept. If the remote fails the temporary entry
  /// stays cached as unsynced.
  pub async fn add_item(&self, family_id: &str, new_item: NewItem) -> Result<Added, ValidationError> {
    if new_item.name.trim().is_empty() {
      return Err(ValidationError::EmptyName);
    }
    if family_id.trim().is_empty() {
      return Err(ValidationError::MissingFamily);
    }

    let pending = new_item.into_pending(Utc::now());
    self.cache.insert(pending.clone());
    debug!(family_id, temp_id = %pending.id, name = %pending.name, "optimistically added item");

    match self.remote.create(family_id, &pending).await {
      Ok(created) => {
        let item = created.normalized().merged_with_local(&pending);
        self.cache.delete_by_id(&pending.id);
        self.cache.insert(item.clone());
        info!(family_id, id = %item.id, name = %item.name, "item synced");

        if item.priority == Priority::Urgent {
          self.notify_urgent(family_id, &item);
        }
        Ok(Added {
          item,
          outcome: SyncOutcome::Synced,
        })
      }
      Err(e) => {
        warn!(family_id, temp_id = %pending.id, error = %e, "remote create failed, item left unsynced");
        Ok(Added {
          item: pending,
          outcome: SyncOutcome::Pending {
            reason: e.to_string(),
          },
        })
      }
    }
  }

  /// Replace a cached item and push it to the remote.
  ///
  /// A refused or failed remote update restores the previously cached
  /// version, if there was one.
  pub async fn update_item(&self, family_id: &str, item: Item) -> SyncOutcome {
    let item = item.normalized();
    let previous = self.cache.get(&item.id);
    self.cache.update(item.clone());
    debug!(family_id, id = %item.id, completed = item.completed, "optimistically updated item");

    let reason = match self.remote.update(family_id, &item).await {
      Ok(true) => {
        info!(family_id, id = %item.id, "update synced");
        return SyncOutcome::Synced;
      }
      Ok(false) => "remote refused the update".to_string(),
      Err(e) => e.to_string(),
    };

    match previous {
      Some(previous) => {
        self.cache.update(previous);
        warn!(family_id, id = %item.id, %reason, "update failed, rolled back");
        SyncOutcome::RolledBack { reason }
      }
      None => {
        warn!(family_id, id = %item.id, %reason, "update failed, nothing to roll back");
        SyncOutcome::Pending { reason }
      }
    }
  }

  /// Flip the completed flag of a cached item.
  pub async fn toggle_completed(&self, family_id: &str, item_id: &str) -> SyncOutcome {
    let Some(item) = self.cache.get(item_id) else {
      debug!(family_id, item_id, "toggle on uncached item");
      return SyncOutcome::NotFound;
    };
    self.update_item(family_id, item.toggled(Utc::now())).await
  }

  /// Remove an item locally, then remotely.
  ///
  /// A failed remote delete is not rolled back; the item stays gone locally
  /// and the outcome is `Pending`. An item that never reached the remote is
  /// only removed locally.
  pub async fn delete_item(&self, family_id: &str, item_id: &str) -> SyncOutcome {
    let Some(item) = self.cache.get(item_id) else {
      debug!(family_id, item_id, "delete on uncached item");
      return SyncOutcome::NotFound;
    };
    self.cache.delete_by_id(item_id);
    if !item.is_synced() {
      debug!(family_id, item_id, "deleted unsynced item locally");
      return SyncOutcome::Synced;
    }
    debug!(family_id, item_id, "optimistically deleted item");

    let reason = match self.remote.delete(family_id, item_id).await {
      Ok(true) => {
        info!(family_id, item_id, "delete synced");
        return SyncOutcome::Synced;
      }
      Ok(false) => "remote had nothing to delete".to_string(),
      Err(e) => e.to_string(),
    };
    warn!(family_id, item_id, %reason, "remote delete failed, item stays removed locally");
    SyncOutcome::Pending { reason }
  }

  /// Archive every completed item still on the active list.
  ///
  /// Each item goes through [`update_item`](Self::update_item), so a
  /// failure only rolls back that item.
  pub async fn clear_completed_from_active_list(&self, family_id: &str) -> ClearReport {
    let targets: Vec<Item> = self
      .cache
      .snapshot()
      .into_iter()
      .filter(|i| i.completed && !i.archived)
      .collect();

    let mut report = ClearReport::default();
    for mut item in targets {
      item.archived = true;
      if self.update_item(family_id, item).await.is_synced() {
        report.archived += 1;
      } else {
        report.failed += 1;
      }
    }
    info!(family_id, archived = report.archived, failed = report.failed, "cleared completed items");
    report
  }

  /// Number of refresh attempts that have finished so far.
  pub fn refresh_count(&self) -> u64 {
    *self.refreshes.borrow()
  }

  /// Wait until more than `seen` refresh attempts have finished.
  ///
  /// Pair with [`refresh_count`](Self::refresh_count) taken before
  /// subscribing to [`get_list`](Self::get_list) to wait for its first load.
  pub async fn refreshed_since(&self, seen: u64) {
    let mut rx = self.refreshes.subscribe();
    // The sender lives as long as self, so this only returns once satisfied.
    let _ = rx.wait_for(|n| *n > seen).await;
  }

  /// Cached version of one item.
  pub fn item(&self, item_id: &str) -> Option<Item> {
    self.cache.get(item_id)
  }

  /// Drop everything cached, e.g. when switching family.
  pub fn reset(&self) {
    self.cache.clear_all();
  }

  fn notify_urgent(&self, family_id: &str, item: &Item) {
    let notifier = Arc::clone(&self.notifier);
    let family_id = family_id.to_string();
    let item_name = item.name.clone();
    let actor = item
      .added_by_name
      .clone()
      .unwrap_or_else(|| item.added_by.clone());

    tokio::spawn(async move {
      if let Err(e) = notifier.notify_urgent(&family_id, &item_name, &actor).await {
        warn!(%family_id, %item_name, error = %e, "urgent notification failed");
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::family::mock::{FailureMode, MockBackend, MockOp};
  use crate::family::types::TEMP_ID_PREFIX;
  use chrono::{DateTime, TimeZone};
  use std::time::Duration;
  use tokio::time::timeout;

  const FAMILY: &str = "fam";

  fn setup() -> (Arc<MockBackend>, SyncRepository) {
    let backend = Arc::new(MockBackend::new());
    let repo = SyncRepository::new(backend.clone(), backend.clone());
    (backend, repo)
  }

  fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
  }

  fn item(id: &str, name: &str) -> Item {
    Item {
      id: id.to_string(),
      name: name.to_string(),
      completed: false,
      priority: Priority::Normal,
      added_by: "u1".to_string(),
      added_by_name: Some("Dad".to_string()),
      created_at: at(0),
      completed_at: None,
      category: None,
      quantity: None,
      unit: None,
      location: None,
      archived: false,
    }
  }

  fn names(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
  }

  async fn wait_for_notifications(backend: &MockBackend, count: usize) {
    timeout(Duration::from_secs(1), async {
      while backend.notifications().len() < count {
        tokio::time::sleep(Duration::from_millis(5)).await;
      }
    })
    .await
    .expect("notification was not sent");
  }

  #[tokio::test]
  async fn test_add_swaps_temp_id_for_remote_id() {
    let (backend, repo) = setup();
    let mut new = NewItem::new("Milk", "u1").with_added_by_name("Dad");
    new.category = Some("Dairy".to_string());

    let added = repo.add_item(FAMILY, new).await.unwrap();
    assert_eq!(added.outcome, SyncOutcome::Synced);

    let cached = repo.cache.snapshot();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "Milk");
    assert_eq!(cached[0].id, backend.items(FAMILY)[0].id);
    assert!(!cached[0].id.starts_with(TEMP_ID_PREFIX));
    assert_eq!(cached[0].category.as_deref(), Some("Dairy"));
    assert_eq!(cached[0].added_by_name.as_deref(), Some("Dad"));
    assert_eq!(added.item, cached[0]);
  }

  #[tokio::test]
  async fn test_add_failure_keeps_temp_item() {
    let (backend, repo) = setup();
    backend.fail(MockOp::Create, FailureMode::Unavailable);

    let added = repo.add_item(FAMILY, NewItem::new("Eggs", "u1")).await.unwrap();
    assert!(matches!(added.outcome, SyncOutcome::Pending { .. }));

    let cached = repo.cache.snapshot();
    assert_eq!(names(&cached), vec!["Eggs"]);
    assert!(cached[0].id.starts_with(TEMP_ID_PREFIX));
    assert!(!cached[0].is_synced());
  }

  #[tokio::test]
  async fn test_add_validates_before_mutating() {
    let (_, repo) = setup();
    assert_eq!(
      repo.add_item(FAMILY, NewItem::new("   ", "u1")).await,
      Err(ValidationError::EmptyName)
    );
    assert_eq!(
      repo.add_item("", NewItem::new("Milk", "u1")).await,
      Err(ValidationError::MissingFamily)
    );
    assert!(repo.cache.is_empty());
  }

  #[tokio::test]
  async fn test_update_rolls_back_on_error() {
    let (backend, repo) = setup();
    backend.set_items(FAMILY, vec![item("5", "Bread")]);
    repo.refresh(FAMILY).await.unwrap();
    backend.fail(MockOp::Update, FailureMode::Unavailable);

    let done = item("5", "Bread").toggled(at(10));
    let outcome = repo.update_item(FAMILY, done).await;
    assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));

    let cached = repo.item("5").unwrap();
    assert!(!cached.completed);
    assert_eq!(cached.completed_at, None);
  }

  #[tokio::test]
  async fn test_update_rolls_back_on_refusal() {
    let (backend, repo) = setup();
    backend.set_items(FAMILY, vec![item("5", "Bread")]);
    repo.refresh(FAMILY).await.unwrap();
    backend.fail(MockOp::Update, FailureMode::Reject);

    let outcome = repo.toggle_completed(FAMILY, "5").await;
    assert!(matches!(outcome, SyncOutcome::RolledBack { .. }));
    assert!(!repo.item("5").unwrap().completed);
  }

  #[tokio::test]
  async fn test_update_of_uncached_item_is_pending_on_failure() {
    let (backend, repo) = setup();
    backend.fail(MockOp::Update, FailureMode::Unavailable);

    let outcome = repo.update_item(FAMILY, item("7", "Rice")).await;
    assert!(matches!(outcome, SyncOutcome::Pending { .. }));
    assert!(repo.cache.is_empty());
  }

  #[tokio::test]
  async fn test_toggle_syncs_and_sets_timestamp() {
    let (backend, repo) = setup();
    backend.set_items(FAMILY, vec![item("5", "Bread")]);
    repo.refresh(FAMILY).await.unwrap();

    assert_eq!(repo.toggle_completed(FAMILY, "5").await, SyncOutcome::Synced);
    let cached = repo.item("5").unwrap();
    assert!(cached.completed);
    assert!(cached.completed_at.is_some());
    assert!(backend.items(FAMILY)[0].completed);

    assert_eq!(repo.toggle_completed(FAMILY, "missing").await, SyncOutcome::NotFound);
  }

  #[tokio::test]
  async fn test_delete_is_not_rolled_back() {
    let (backend, repo) = setup();
    backend.set_items(FAMILY, vec![item("9", "Jam")]);
    repo.refresh(FAMILY).await.unwrap();
    backend.fail(MockOp::Delete, FailureMode::Unavailable);

    let outcome = repo.delete_item(FAMILY, "9").await;
    assert!(matches!(outcome, SyncOutcome::Pending { .. }));
    assert_eq!(repo.item("9"), None);
    assert_eq!(backend.items(FAMILY).len(), 1);
  }

  #[tokio::test]
  async fn test_delete_of_uncached_item_skips_remote() {
    let (backend, repo) = setup();
    backend.set_items(FAMILY, vec![item("9", "Jam")]);

    assert_eq!(repo.delete_item(FAMILY, "9").await, SyncOutcome::NotFound);
    assert_eq!(backend.items(FAMILY).len(), 1);
  }

  #[tokio::test]
  async fn test_delete_of_unsynced_item_stays_local() {
    let (backend, repo) = setup();
    backend.fail(MockOp::Create, FailureMode::Unavailable);
    let added = repo.add_item(FAMILY, NewItem::new("Eggs", "u1")).await.unwrap();
    assert!(!added.item.is_synced());

    backend.fail(MockOp::Delete, FailureMode::Unavailable);
    assert_eq!(repo.delete_item(FAMILY, &added.item.id).await, SyncOutcome::Synced);
    assert!(repo.cache.is_empty());
  }

  #[tokio::test]
  async fn test_refresh_replaces_locally_merged_fields() {
    let (_backend, repo) = setup();
    let mut new = NewItem::new("Milk", "u1").with_priority(Priority::Urgent);
    new.quantity = Some("2".to_string());
    new.unit = Some("l".to_string());
    let added = repo.add_item(FAMILY, new).await.unwrap();
    assert_eq!(added.item.priority, Priority::Urgent);
    assert_eq!(added.item.unit.as_deref(), Some("l"));

    // The remote row only carries core fields, and a refresh trusts it.
    repo.refresh(FAMILY).await.unwrap();
    let cached = repo.item(&added.item.id).unwrap();
    assert_eq!(cached.priority, Priority::Normal);
    assert_eq!(cached.quantity, None);
    assert_eq!(cached.unit, None);
  }

  #[tokio::test]
  async fn test_completed_items_newest_first() {
    let (backend, repo) = setup();
    backend.set_items(
      FAMILY,
      vec![
        item("a", "A").toggled(at(100)),
        item("b", "B").toggled(at(300)),
        item("open", "Open"),
        item("c", "C").toggled(at(200)),
      ],
    );
    repo.refresh(FAMILY).await.unwrap();

    let mut history = repo.get_completed_items(FAMILY);
    let done = history.next().await.unwrap();
    let times: Vec<_> = done.iter().map(|i| i.completed_at).collect();
    assert_eq!(times, vec![Some(at(300)), Some(at(200)), Some(at(100))]);
  }

  #[tokio::test]
  async fn test_refresh_replaces_cache() {
    let (backend, repo) = setup();
    repo.cache.insert_all(vec![item("a", "A"), item("b", "B")]);
    backend.set_items(FAMILY, vec![item("c", "C")]);

    assert_eq!(repo.refresh(FAMILY).await.unwrap(), 1);
    assert_eq!(names(&repo.cache.snapshot()), vec!["C"]);
  }

  #[tokio::test]
  async fn test_refresh_failure_keeps_cache() {
    let (backend, repo) = setup();
    repo.cache.insert_all(vec![item("a", "A"), item("b", "B")]);
    backend.fail(MockOp::FetchList, FailureMode::Unavailable);

    assert!(repo.refresh(FAMILY).await.is_err());
    assert_eq!(names(&repo.cache.snapshot()), vec!["A", "B"]);
  }

  #[tokio::test]
  async fn test_get_list_emits_cache_then_remote() {
    let backend = Arc::new(MockBackend::new().with_latency(Duration::from_millis(20)));
    let repo = SyncRepository::new(backend.clone(), backend.clone());
    repo.cache.insert_all(vec![item("a", "A"), item("b", "B")]);
    backend.set_items(FAMILY, vec![item("c", "C")]);

    let mut list = repo.get_list(FAMILY);
    let first = list.next().await.unwrap();
    assert_eq!(names(&first), vec!["A", "B"]);

    let refreshed = timeout(Duration::from_secs(1), async {
      loop {
        let next = list.next().await.unwrap();
        if names(&next) == vec!["C"] {
          break next;
        }
      }
    })
    .await
    .expect("refresh never reached the stream");
    assert_eq!(refreshed.len(), 1);
  }

  #[tokio::test]
  async fn test_refreshed_since_waits_for_background_refresh() {
    let backend = Arc::new(MockBackend::new().with_latency(Duration::from_millis(20)));
    let repo = SyncRepository::new(backend.clone(), backend.clone());
    backend.set_items(FAMILY, vec![item("c", "C")]);

    let seen = repo.refresh_count();
    let list = repo.get_list(FAMILY);
    let task = tokio::spawn(list.collect::<Vec<_>>());
    timeout(Duration::from_secs(1), repo.refreshed_since(seen))
      .await
      .expect("background refresh never finished");
    assert_eq!(repo.refresh_count(), seen + 1);
    assert_eq!(names(&repo.cache.snapshot()), vec!["C"]);
    task.abort();

    // Failed attempts count too, so waiters are never stuck.
    backend.fail(MockOp::FetchList, FailureMode::Unavailable);
    assert!(repo.refresh(FAMILY).await.is_err());
    assert_eq!(repo.refresh_count(), seen + 2);
  }

  #[tokio::test]
  async fn test_dropping_list_cancels_refresh() {
    let backend = Arc::new(MockBackend::new().with_latency(Duration::from_millis(100)));
    let repo = SyncRepository::new(backend.clone(), backend.clone());
    repo.cache.insert(item("a", "A"));
    backend.set_items(FAMILY, vec![item("c", "C")]);

    let mut list = repo.get_list(FAMILY);
    list.next().await;
    drop(list);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(names(&repo.cache.snapshot()), vec!["A"]);
  }

  #[tokio::test]
  async fn test_urgent_add_sends_one_notification() {
    let (backend, repo) = setup();
    let urgent = NewItem::new("Eggs", "u2")
      .with_priority(Priority::Urgent)
      .with_added_by_name("Mom");

    repo.add_item(FAMILY, urgent).await.unwrap();
    wait_for_notifications(&backend, 1).await;
    let sent = backend.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].item_name, "Eggs");
    assert_eq!(sent[0].actor_name, "Mom");

    repo.add_item(FAMILY, NewItem::new("Bread", "u2")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(backend.notifications().len(), 1);
  }

  #[tokio::test]
  async fn test_failing_notifier_does_not_affect_add() {
    let (backend, repo) = setup();
    backend.fail(MockOp::Notify, FailureMode::Unavailable);
    let urgent = NewItem::new("Eggs", "u2").with_priority(Priority::Urgent);

    let added = repo.add_item(FAMILY, urgent).await.unwrap();
    assert_eq!(added.outcome, SyncOutcome::Synced);
    assert!(added.item.is_synced());
  }

  #[tokio::test]
  async fn test_clear_completed_archives_into_history() {
    let (backend, repo) = setup();
    backend.set_items(
      FAMILY,
      vec![
        item("a", "A").toggled(at(100)),
        item("b", "B"),
        item("c", "C").toggled(at(200)),
      ],
    );
    repo.refresh(FAMILY).await.unwrap();

    let report = repo.clear_completed_from_active_list(FAMILY).await;
    assert_eq!(report, ClearReport { archived: 2, failed: 0 });

    let active = repo.get_active_list(FAMILY).next().await.unwrap();
    assert_eq!(names(&active), vec!["B"]);
    let history = repo.get_completed_items(FAMILY).next().await.unwrap();
    assert_eq!(names(&history), vec!["C", "A"]);

    assert_eq!(repo.toggle_completed(FAMILY, "a").await, SyncOutcome::Synced);
    let reopened = repo.item("a").unwrap();
    assert!(!reopened.archived);
    assert!(!reopened.completed);
  }

  #[tokio::test]
  async fn test_clear_completed_counts_failures() {
    let (backend, repo) = setup();
    backend.set_items(FAMILY, vec![item("a", "A").toggled(at(100))]);
    repo.refresh(FAMILY).await.unwrap();
    backend.fail(MockOp::Update, FailureMode::Reject);

    let report = repo.clear_completed_from_active_list(FAMILY).await;
    assert_eq!(report, ClearReport { archived: 0, failed: 1 });
    assert!(!repo.item("a").unwrap().archived);
  }

  #[test]
  fn test_outcome_problems() {
    assert_eq!(SyncOutcome::Synced.problem(), None);
    assert!(SyncOutcome::NotFound.problem().is_some());
    assert!(SyncOutcome::Pending {
      reason: "offline".to_string()
    }
    .problem()
    .unwrap()
    .contains("offline"));
  }
}
