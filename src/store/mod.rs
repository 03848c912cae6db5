//! Persistence layer for onboarding profiles.

pub mod firestore;
pub mod memory;
pub mod traits;

pub use firestore::FirestoreProfileStore;
pub use memory::MemoryProfileStore;
pub use traits::ProfileStore;
