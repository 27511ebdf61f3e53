//! simsearch-core - Soracom SIM search client library.
//!
//! This crate holds everything that is independent of the terminal UI:
//!
//! - `api`: the authenticated, cursor-paginating `ApiClient`
//! - `auth`: coverage selection and session `Credentials`
//! - `models`: the `Sim` record and its nested types
//! - `config`: config file and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ClientOptions, SimFilter, SimPage, SimQuery};
pub use auth::{Coverage, Credentials, Endpoints};
pub use config::Config;
pub use models::Sim;
