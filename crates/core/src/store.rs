//! ProfileStore trait — where user profiles live.
//!
//! The store exclusively owns every `UserProfile`. Callers receive a
//! `ProfileHandle` and lock it for the duration of one turn; the lock is what
//! serializes concurrent turns for the same user while leaving different
//! users fully independent.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::profile::UserProfile;

/// Shared, lockable reference to one stored profile.
pub type ProfileHandle = Arc<Mutex<UserProfile>>;

/// The core ProfileStore trait.
///
/// Implementations: in-memory (`seriesai-memory`). A durable backend can be
/// swapped in without touching the turn processor.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Return the profile for `user_id`, creating an empty one on first contact.
    ///
    /// Check-then-create is atomic: concurrent first calls for the same id
    /// all receive the same handle.
    async fn get_or_create(&self, user_id: &str) -> ProfileHandle;

    /// Return the profile for `user_id` if it exists.
    async fn get(&self, user_id: &str) -> Option<ProfileHandle>;

    /// All known user ids, sorted.
    async fn user_ids(&self) -> Vec<String>;

    /// Number of stored profiles.
    async fn len(&self) -> usize;

    /// Whether the store holds no profiles.
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
