//! Salon Core - Shared types library.
//!
//! This crate provides common types used across all Smart Salon components:
//! - `app` - Web application serving the admin and client sections
//! - `cli` - Command-line tools for migrations and account provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles,
//!   and statuses
//! - [`authz`] - The session/authorization state machine that decides which
//!   application section a user may reach

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod types;

pub use types::*;
