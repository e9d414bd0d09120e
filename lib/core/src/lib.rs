//! Core types shared by the ticketgate crates.
//!
//! This crate provides the `Result` alias used for layered error reporting
//! and the strongly-typed identifier for stored principals.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, UserId};
