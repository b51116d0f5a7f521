//! parley-core - domain logic for the parley user/admin messaging service.
//!
//! This crate owns the message model, the SQLite-backed message store,
//! derived thread states, the to-do/history queue views, paging, and the
//! service facade consumed by the CLI.

pub mod config;
pub mod core;
pub mod identity;
pub mod message;
pub mod page;
pub mod state;
pub mod store;
pub mod version;
