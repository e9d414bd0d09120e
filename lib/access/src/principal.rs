//! The principal: an identity resolved after authentication.
//!
//! Principals are keyed by `username`, which is unique and never changes.
//! The internal `id` is what storage uses as a primary key.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use ticketgate_core::UserId;

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar";

/// Builds the default avatar URL for an email address.
///
/// Gravatar hashes the trimmed, lowercased address; the identicon fallback
/// keeps the URL useful for addresses that have no registered image.
#[must_use]
pub fn default_avatar(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{GRAVATAR_BASE}/{}?d=identicon", hex::encode(digest))
}

/// An authenticated identity as held by the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Internal storage ID.
    id: UserId,
    /// Unique, immutable login name.
    username: String,
    /// Contact address; also the seed for the default avatar.
    email: String,
    /// PHC-encoded password hash.
    password_hash: Option<String>,
    /// Avatar image URL.
    avatar: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Principal {
    /// Creates a new principal with a generated ID and no credentials.
    #[must_use]
    pub fn new(username: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username,
            email,
            password_hash: None,
            avatar: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes a principal from storage.
    #[must_use]
    pub fn with_all_fields(
        id: UserId,
        username: String,
        email: String,
        password_hash: Option<String>,
        avatar: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            avatar,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the stored password hash, if the principal has one.
    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the password hash.
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = Some(password_hash);
        self.updated_at = Utc::now();
    }

    /// Replaces the avatar URL.
    pub fn set_avatar(&mut self, avatar: Option<String>) {
        self.avatar = avatar;
        self.updated_at = Utc::now();
    }

    /// Fills in the avatar from the email if none is set.
    pub fn init_avatar(&mut self) {
        if self.avatar.is_none() {
            self.set_avatar(Some(default_avatar(&self.email)));
        }
    }
}
