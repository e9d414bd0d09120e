//! ticketgate web server.
//!
//! Serves password login, the CAS ticket callback and the current-user
//! lookup on top of `ticketgate-access`, with sessions carried in a signed
//! cookie.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
