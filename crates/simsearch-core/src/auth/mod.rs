//! Authentication module for Soracom API sessions.
//!
//! This module provides:
//! - `Coverage`: which of the two API deployments (global or Japan) a session targets
//! - `Endpoints`: the base URL for each coverage
//! - `Credentials`: the immutable API key / token pair produced by a login
//!
//! Credentials only ever live in memory. Dropping the client that holds
//! them ends the session.

pub mod coverage;
pub mod credentials;

pub use coverage::{Coverage, Endpoints};
pub use credentials::Credentials;
