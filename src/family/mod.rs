//! Family shopping list domain: items, members, backends and the sync
//! repository that ties the local cache to a backend.

pub mod api_types;
pub mod catalog;
mod error;
pub mod mock;
mod remote;
mod repository;
pub mod rest;
mod types;
mod voice;

pub use error::ValidationError;
pub use remote::{FamilyDirectory, Notifier, RemoteStore};
pub use repository::SyncRepository;
pub use types::{is_valid_family_code, Family, Item, NewItem, Priority, User};
pub use voice::{ScriptedVoice, VoiceInput};
