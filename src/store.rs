//! In-memory user record store

use std::collections::BTreeMap;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::User;

/// Users keyed by id, guarded by a single async mutex
#[derive(Debug, Default)]
pub struct UserStore {
    users: Mutex<BTreeMap<i64, User>>,
}

impl UserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// All users, ordered by id
    pub async fn list(&self) -> Vec<User> {
        self.users.lock().await.values().cloned().collect()
    }

    /// Look up one user
    pub async fn get(&self, id: i64) -> Option<User> {
        self.users.lock().await.get(&id).cloned()
    }

    /// Whether a user with this id exists
    pub async fn contains(&self, id: i64) -> bool {
        self.users.lock().await.contains_key(&id)
    }

    /// Add a new user; fails if the id is taken
    pub async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.id) {
            return Err(Error::Duplicate { id: user.id });
        }
        users.insert(user.id, user);
        Ok(())
    }

    /// Overwrite an existing user, returning the stored copy
    pub async fn replace(&self, user: User) -> Result<User> {
        let mut users = self.users.lock().await;
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(slot.clone())
            }
            None => Err(Error::UserNotFound { id: user.id }),
        }
    }

    /// Remove a user, returning it
    pub async fn remove(&self, id: i64) -> Result<User> {
        self.users
            .lock()
            .await
            .remove(&id)
            .ok_or(Error::UserNotFound { id })
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}
