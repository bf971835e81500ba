//! In-memory profile store — profiles live for the lifetime of the process.

use async_trait::async_trait;
use seriesai_core::profile::UserProfile;
use seriesai_core::store::{ProfileHandle, ProfileStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Keeps every profile in a map keyed by user id.
///
/// The map lock is only held long enough to find or insert a handle; the
/// per-profile mutex inside the handle is what callers hold during a turn.
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, ProfileHandle>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get_or_create(&self, user_id: &str) -> ProfileHandle {
        if let Some(handle) = self.profiles.read().await.get(user_id) {
            return handle.clone();
        }

        // Re-check under the write lock: another task may have won the race.
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "Creating profile");
                Arc::new(Mutex::new(UserProfile::new(user_id)))
            })
            .clone()
    }

    async fn get(&self, user_id: &str) -> Option<ProfileHandle> {
        self.profiles.read().await.get(user_id).cloned()
    }

    async fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.profiles.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }
}
