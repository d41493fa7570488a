//! # Commitment Store
//!
//! Durable map from username to commitment. The protocol needs two
//! operations:
//!
//! - `create`: insert a record only if the username is free, as one atomic
//!   step. A check-then-insert pair would let two concurrent registrations
//!   for the same name both succeed.
//! - `get`: look up a record. Reads run concurrently with unrelated writes.
//!
//! [`MemoryStore`] is the in-process backend; the API crate adds a SQLite
//! backend behind the same trait.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use zkauth_core::{UserRecord, Username};

use crate::error::StoreError;

/// Backend contract for user records.
pub trait CommitmentStore: Send + Sync + 'static {
    /// Insert `record` if its username is unregistered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the username exists, leaving the
    /// existing record untouched.
    fn create(&self, record: UserRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Look up a record.
    fn get(
        &self,
        username: &Username,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Number of registered users.
    fn count(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// In-memory store guarded by a `parking_lot::RwLock`.
///
/// Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<Username, UserRecord>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommitmentStore for MemoryStore {
    async fn create(&self, record: UserRecord) -> Result<(), StoreError> {
        match self.records.write().entry(record.username.clone()) {
            Entry::Occupied(existing) => Err(StoreError::Conflict(existing.key().to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, username: &Username) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.records.read().get(username).cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.records.read().len() as u64)
    }
}
