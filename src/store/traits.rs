//! `ProfileStore` trait: the one write the onboarding flow needs.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::onboarding::model::UserProfileDocument;

/// Document store holding onboarding profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Create or overwrite the profile document for `uid` in the `users`
    /// collection.
    async fn save_profile(&self, uid: &str, profile: &UserProfileDocument)
    -> Result<(), StoreError>;
}
