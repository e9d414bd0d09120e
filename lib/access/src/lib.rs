//! Authentication core for ticketgate.
//!
//! This crate provides:
//! - Stateless signed session tokens (`TokenCodec`)
//! - Password hashing and verification (`credential`)
//! - CAS ticket exchange with automatic user provisioning (`SsoExchanger`)
//! - Local password login and session resolution (`Authenticator`)
//!
//! Storage and HTTP transport are supplied by the caller through the
//! `UserStore` and `TicketTransport` traits.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use ticketgate_access::TokenCodec;
//!
//! let codec = TokenCodec::new("k1", Duration::hours(1)).expect("non-empty key");
//! let issued_at = Utc::now();
//! let token = codec.encode_at("alice", issued_at).expect("encode");
//!
//! let username = codec
//!     .decode_at(token.as_str(), issued_at + Duration::minutes(30))
//!     .expect("still valid");
//! assert_eq!(username, "alice");
//!
//! assert!(codec
//!     .decode_at(token.as_str(), issued_at + Duration::minutes(61))
//!     .is_err());
//! ```
//!
//! # Logout
//!
//! Tokens are not tracked server-side, so there is nothing to revoke.
//! Logging out means the transport layer drops the client's cookie; a
//! copied token stays valid until it expires or the key is rotated.

pub mod auth;
pub mod cas;
pub mod credential;
pub mod error;
pub mod exchange;
pub mod principal;
pub mod store;
pub mod token;

// Re-export main types at crate root
pub use auth::Authenticator;
pub use cas::{CasConfig, TicketAssertion, parse_assertion};
pub use credential::{hash_password, verify_password};
pub use error::{AuthError, CredentialError, PUBLIC_FAILURE_MESSAGE, SsoError, StoreError, TokenError};
pub use exchange::{SsoExchanger, TicketTransport};
pub use principal::{Principal, default_avatar};
pub use store::{InMemoryUserStore, UserStore};
pub use token::{SessionToken, TokenCodec};
