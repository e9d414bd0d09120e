//! Error handling foundation for ticketgate.
//!
//! Only the `Result` alias lives here. Each crate owns its domain error
//! enums and wraps them in a rootcause `Report`, so callers can attach
//! their own context while the typed error stays reachable through
//! `Report::current_context`.

use rootcause::Report;

/// A Result whose error side is a rootcause report carrying context `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
