//! In-process profile store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::ProfileStore;
use crate::error::StoreError;
use crate::onboarding::model::UserProfileDocument;

/// Profiles kept in a map keyed by uid. Used for local runs and tests.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfileDocument>>,
    writes: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, uid: &str) -> Option<UserProfileDocument> {
        self.profiles.read().await.get(uid).cloned()
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }

    /// Total number of writes accepted, including overwrites.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn save_profile(
        &self,
        uid: &str,
        profile: &UserProfileDocument,
    ) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .insert(uid.to_string(), profile.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(uid = %uid, "Profile stored in memory");
        Ok(())
    }
}
