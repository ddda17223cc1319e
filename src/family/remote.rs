//! Backend contracts consumed by the repository and the app.

use async_trait::async_trait;

use super::error::RemoteError;
use super::types::{Family, Item, User};

/// Item storage scoped to a family.
#[async_trait]
pub trait RemoteStore: Send + Sync {
  /// Full list for a family.
  async fn fetch_list(&self, family_id: &str) -> Result<Vec<Item>, RemoteError>;

  /// Create an item. The returned item carries the server-assigned id.
  async fn create(&self, family_id: &str, item: &Item) -> Result<Item, RemoteError>;

  /// Returns `false` when the server refused the update.
  async fn update(&self, family_id: &str, item: &Item) -> Result<bool, RemoteError>;

  /// Returns `false` when there was nothing to delete.
  async fn delete(&self, family_id: &str, item_id: &str) -> Result<bool, RemoteError>;
}

/// Family membership and presence.
#[async_trait]
pub trait FamilyDirectory: Send + Sync {
  /// Create a family with `nickname` as its first member.
  ///
  /// Returns the family and the member record created for the caller.
  async fn create_family(
    &self,
    family_name: &str,
    nickname: &str,
    avatar: &str,
  ) -> Result<(Family, User), RemoteError>;

  /// Join the family owning `code`.
  async fn join_family(
    &self,
    code: &str,
    nickname: &str,
    avatar: &str,
  ) -> Result<(Family, User), RemoteError>;

  async fn get_family(&self, family_id: &str) -> Result<Option<Family>, RemoteError>;

  /// Members with `is_online` computed against the backend clock.
  async fn members_with_status(&self, family_id: &str) -> Result<Vec<User>, RemoteError>;

  /// Mark `user_id` as seen now.
  async fn heartbeat(&self, family_id: &str, user_id: &str) -> Result<(), RemoteError>;
}

/// Push notification trigger.
#[async_trait]
pub trait Notifier: Send + Sync {
  async fn notify_urgent(
    &self,
    family_id: &str,
    item_name: &str,
    actor_name: &str,
  ) -> Result<(), RemoteError>;
}
