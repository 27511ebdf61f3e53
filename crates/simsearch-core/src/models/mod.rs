//! Data models for Soracom entities.
//!
//! - `Sim`: one provisioned SIM card with its status, profiles and tags
//! - `Profile`, `Subscriber`, `Capabilities`: per-ICCID subscription details
//! - `SessionStatus`: online flag and assigned address
//! - `SimTags`: the guaranteed `name` tag plus arbitrary extra tags

pub mod sim;

pub use sim::{Capabilities, Profile, SessionStatus, Sim, SimTags, Subscriber, NAME_TAG};
