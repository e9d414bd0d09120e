//! User store abstraction.
//!
//! The access crate never talks to a database directly. Callers supply a
//! `UserStore`; the server crate backs it with Postgres and tests use
//! [`InMemoryUserStore`].

use async_trait::async_trait;
use std::collections::HashMap;
use ticketgate_core::Result;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::principal::Principal;

/// Persistence for principals, keyed by username.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks a principal up by username. `Ok(None)` means no such user.
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError>;

    /// Inserts `principal`, or, if a row with the same username exists,
    /// overwrites only its password hash and avatar.
    ///
    /// Must be atomic: concurrent calls for the same new username converge
    /// on a single row without surfacing a conflict. Returns the row as
    /// stored.
    async fn upsert_on_username_conflict(
        &self,
        principal: &Principal,
    ) -> Result<Principal, StoreError>;
}

/// A `UserStore` held in process memory.
///
/// The whole upsert runs under one lock, which gives it the same atomicity
/// a database `ON CONFLICT` clause provides.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, Principal>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored principals.
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }

    /// Inserts or replaces a principal wholesale, bypassing upsert rules.
    pub async fn insert(&self, principal: Principal) {
        self.users
            .lock()
            .await
            .insert(principal.username().to_string(), principal);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self.users.lock().await.get(username).cloned())
    }

    async fn upsert_on_username_conflict(
        &self,
        principal: &Principal,
    ) -> Result<Principal, StoreError> {
        let mut users = self.users.lock().await;
        let stored = users
            .entry(principal.username().to_string())
            .and_modify(|existing| {
                if let Some(hash) = principal.password_hash() {
                    existing.set_password_hash(hash.to_string());
                }
                existing.set_avatar(principal.avatar().map(str::to_string));
            })
            .or_insert_with(|| principal.clone());
        Ok(stored.clone())
    }
}
