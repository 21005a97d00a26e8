//! Business logic services.

pub mod auth;
pub mod authz;
pub mod google;
pub mod usage;

pub use auth::AuthService;
pub use authz::{GateOptions, SessionFlow, resolve_decision};
pub use google::GoogleVerifier;
