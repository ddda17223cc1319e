//! In-process simulated backend.
//!
//! All state lives in one `MockBackend` value created at start-up; nothing
//! is global. Latency and per-operation failures can be injected so the
//! optimistic paths of the repository can be exercised without a server.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{RemoteError, ValidationError};
use super::remote::{FamilyDirectory, Notifier, RemoteStore};
use super::types::{is_valid_family_code, random_family_code, Family, Item, Priority, User};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockOp {
  FetchList,
  Create,
  Update,
  Delete,
  Notify,
}

/// How an injected failure shows up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
  /// The server answers but refuses (`false` for update/delete)
  Reject,
  /// The call itself errors out
  Unavailable,
}

/// A notification the backend was asked to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
  pub family_id: String,
  pub item_name: String,
  pub actor_name: String,
}

#[derive(Default)]
struct MockState {
  families: Vec<Family>,
  items: HashMap<String, Vec<Item>>,
  failures: HashMap<MockOp, FailureMode>,
  notifications: Vec<SentNotification>,
}

/// Simulated family backend
pub struct MockBackend {
  state: Mutex<MockState>,
  latency: Duration,
  presence_window: ChronoDuration,
}

impl Default for MockBackend {
  fn default() -> Self {
    Self::new()
  }
}

impl MockBackend {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(MockState::default()),
      latency: Duration::ZERO,
      presence_window: ChronoDuration::minutes(5),
    }
  }

  /// Delay every call by `latency`.
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  pub fn with_presence_window(mut self, window: ChronoDuration) -> Self {
    self.presence_window = window;
    self
  }

  /// Make `op` fail until [`recover`](Self::recover) is called.
  pub fn fail(&self, op: MockOp, mode: FailureMode) {
    self.lock().failures.insert(op, mode);
  }

  pub fn recover(&self, op: MockOp) {
    self.lock().failures.remove(&op);
  }

  /// Replace the server-side list of a family.
  pub fn set_items(&self, family_id: &str, items: Vec<Item>) {
    self.lock().items.insert(family_id.to_string(), items);
  }

  /// Server-side list of a family.
  pub fn items(&self, family_id: &str) -> Vec<Item> {
    self
      .lock()
      .items
      .get(family_id)
      .cloned()
      .unwrap_or_default()
  }

  pub fn notifications(&self) -> Vec<SentNotification> {
    self.lock().notifications.clone()
  }

  /// Populate a demo family with three members and a short list.
  ///
  /// Uses the fixed join code `123456`.
  pub fn seed_demo(&self) -> Family {
    let now = Utc::now();
    let member = |nickname: &str, seen_ago: ChronoDuration| User {
      last_seen: Some(now - seen_ago),
      ..User::new(Uuid::new_v4().to_string(), nickname)
    };
    let members = vec![
      member("Dad", ChronoDuration::zero()),
      member("Mom", ChronoDuration::hours(1)),
      member("Sam", ChronoDuration::days(2)),
    ];

    let item = |name: &str, by: &User, priority: Priority| Item {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      completed: false,
      priority,
      added_by: by.id.clone(),
      added_by_name: Some(by.nickname.clone()),
      created_at: now - ChronoDuration::hours(3),
      completed_at: None,
      category: None,
      quantity: None,
      unit: None,
      location: None,
      archived: false,
    };
    let mut milk = item("Milk", &members[0], Priority::Normal);
    milk.set_completed(true, now - ChronoDuration::hours(1));
    let items = vec![
      milk,
      item("Eggs", &members[1], Priority::Urgent),
      item("Bread", &members[0], Priority::Low),
    ];

    let family = Family {
      id: Uuid::new_v4().to_string(),
      name: "Home".to_string(),
      code: "123456".to_string(),
      members,
    };

    let mut state = self.lock();
    state.items.insert(family.id.clone(), items);
    state.families.push(family.clone());
    family
  }

  fn lock(&self) -> MutexGuard<'_, MockState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Wait out the configured latency and report any injected failure.
  async fn simulate(&self, op: MockOp) -> Option<FailureMode> {
    self.delay().await;
    let failure = self.lock().failures.get(&op).copied();
    if let Some(mode) = failure {
      debug!(?op, ?mode, "injected failure");
    }
    failure
  }

  async fn delay(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }

  fn with_presence(&self, family: &Family) -> Family {
    let now = Utc::now();
    Family {
      members: family
        .members
        .iter()
        .cloned()
        .map(|m| m.with_presence(now, self.presence_window))
        .collect(),
      ..family.clone()
    }
  }
}

fn unavailable(op: MockOp) -> RemoteError {
  RemoteError::Unavailable(format!("simulated outage during {:?}", op))
}

fn require(value: &str, field: &'static str) -> Result<(), RemoteError> {
  if value.trim().is_empty() {
    return Err(ValidationError::MissingField(field).into());
  }
  Ok(())
}

#[async_trait]
impl RemoteStore for MockBackend {
  async fn fetch_list(&self, family_id: &str) -> Result<Vec<Item>, RemoteError> {
    match self.simulate(MockOp::FetchList).await {
      Some(FailureMode::Reject) => Err(RemoteError::Rejected("list fetch refused".to_string())),
      Some(FailureMode::Unavailable) => Err(unavailable(MockOp::FetchList)),
      None => Ok(self.items(family_id)),
    }
  }

  async fn create(&self, family_id: &str, item: &Item) -> Result<Item, RemoteError> {
    match self.simulate(MockOp::Create).await {
      Some(FailureMode::Reject) => {
        return Err(RemoteError::Rejected(format!("create '{}' refused", item.name)))
      }
      Some(FailureMode::Unavailable) => return Err(unavailable(MockOp::Create)),
      None => {}
    }

    // Only the core fields are accepted; descriptive ones stay client-side.
    let created = Item {
      id: Uuid::new_v4().to_string(),
      name: item.name.clone(),
      completed: false,
      priority: Priority::default(),
      added_by: item.added_by.clone(),
      added_by_name: None,
      created_at: Utc::now(),
      completed_at: None,
      category: None,
      quantity: None,
      unit: None,
      location: None,
      archived: false,
    };
    self
      .lock()
      .items
      .entry(family_id.to_string())
      .or_default()
      .insert(0, created.clone());
    debug!(family_id, id = %created.id, name = %created.name, "mock created item");
    Ok(created)
  }

  async fn update(&self, family_id: &str, item: &Item) -> Result<bool, RemoteError> {
    match self.simulate(MockOp::Update).await {
      Some(FailureMode::Reject) => return Ok(false),
      Some(FailureMode::Unavailable) => return Err(unavailable(MockOp::Update)),
      None => {}
    }

    let mut state = self.lock();
    let Some(slot) = state
      .items
      .get_mut(family_id)
      .and_then(|items| items.iter_mut().find(|i| i.id == item.id))
    else {
      debug!(family_id, id = %item.id, "mock update target missing");
      return Ok(false);
    };
    *slot = item.clone();
    Ok(true)
  }

  async fn delete(&self, family_id: &str, item_id: &str) -> Result<bool, RemoteError> {
    match self.simulate(MockOp::Delete).await {
      Some(FailureMode::Reject) => return Ok(false),
      Some(FailureMode::Unavailable) => return Err(unavailable(MockOp::Delete)),
      None => {}
    }

    let mut state = self.lock();
    let Some(items) = state.items.get_mut(family_id) else {
      return Ok(false);
    };
    let before = items.len();
    items.retain(|i| i.id != item_id);
    Ok(items.len() != before)
  }
}

#[async_trait]
impl FamilyDirectory for MockBackend {
  async fn create_family(
    &self,
    family_name: &str,
    nickname: &str,
    avatar: &str,
  ) -> Result<(Family, User), RemoteError> {
    require(family_name, "family name")?;
    require(nickname, "nickname")?;
    self.delay().await;

    let user = User {
      avatar: avatar.to_string(),
      last_seen: Some(Utc::now()),
      ..User::new(Uuid::new_v4().to_string(), nickname.trim())
    };

    let mut state = self.lock();
    let code = loop {
      let candidate = random_family_code();
      if !state.families.iter().any(|f| f.code == candidate) {
        break candidate;
      }
    };
    let family = Family {
      id: Uuid::new_v4().to_string(),
      name: family_name.trim().to_string(),
      code,
      members: vec![user.clone()],
    };
    state.families.push(family.clone());
    state.items.entry(family.id.clone()).or_default();
    drop(state);

    info!(family = %family.name, code = %family.code, "mock family created");
    Ok((self.with_presence(&family), user))
  }

  async fn join_family(
    &self,
    code: &str,
    nickname: &str,
    avatar: &str,
  ) -> Result<(Family, User), RemoteError> {
    let code = code.trim();
    if !is_valid_family_code(code) {
      return Err(ValidationError::InvalidFamilyCode.into());
    }
    require(nickname, "nickname")?;
    self.delay().await;

    let user = User {
      avatar: avatar.to_string(),
      last_seen: Some(Utc::now()),
      ..User::new(Uuid::new_v4().to_string(), nickname.trim())
    };

    let mut state = self.lock();
    let Some(family) = state.families.iter_mut().find(|f| f.code == code) else {
      return Err(RemoteError::NotFound(format!("no family with code {}", code)));
    };
    family.members.push(user.clone());
    let family = family.clone();
    drop(state);

    info!(family = %family.name, nickname = %user.nickname, "mock member joined");
    Ok((self.with_presence(&family), user))
  }

  async fn get_family(&self, family_id: &str) -> Result<Option<Family>, RemoteError> {
    let state = self.lock();
    Ok(
      state
        .families
        .iter()
        .find(|f| f.id == family_id)
        .map(|f| self.with_presence(f)),
    )
  }

  async fn members_with_status(&self, family_id: &str) -> Result<Vec<User>, RemoteError> {
    self
      .get_family(family_id)
      .await?
      .map(|f| f.members)
      .ok_or_else(|| RemoteError::NotFound(format!("family {}", family_id)))
  }

  async fn heartbeat(&self, family_id: &str, user_id: &str) -> Result<(), RemoteError> {
    let mut state = self.lock();
    let member = state
      .families
      .iter_mut()
      .find(|f| f.id == family_id)
      .and_then(|f| f.members.iter_mut().find(|m| m.id == user_id))
      .ok_or_else(|| RemoteError::NotFound(format!("member {}", user_id)))?;
    member.last_seen = Some(Utc::now());
    Ok(())
  }
}

#[async_trait]
impl Notifier for MockBackend {
  async fn notify_urgent(
    &self,
    family_id: &str,
    item_name: &str,
    actor_name: &str,
  ) -> Result<(), RemoteError> {
    match self.simulate(MockOp::Notify).await {
      Some(FailureMode::Reject) => {
        return Err(RemoteError::Rejected("notification refused".to_string()))
      }
      Some(FailureMode::Unavailable) => return Err(unavailable(MockOp::Notify)),
      None => {}
    }
    info!(family_id, item_name, actor_name, "urgent item notification sent");
    self.lock().notifications.push(SentNotification {
      family_id: family_id.to_string(),
      item_name: item_name.to_string(),
      actor_name: actor_name.to_string(),
    });
    Ok(())
  }
}
