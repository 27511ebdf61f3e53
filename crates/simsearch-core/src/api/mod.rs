//! REST API client module for the Soracom SIM-management API.
//!
//! This module provides the `ApiClient` for logging in with an auth key
//! pair, searching SIMs with cursor pagination, and fetching single SIMs.
//!
//! Every request other than `/auth` carries the `X-Soracom-API-Key` and
//! `X-Soracom-Token` headers from the session credentials.

pub mod client;
pub mod error;
pub mod query;

pub use client::{ApiClient, ClientOptions, SimPage, DEFAULT_MAX_PAGES};
pub use error::ApiError;
pub use query::{SimFilter, SimQuery, CURSOR_PARAM};
