//! Middleware: session layer and route-gating extractors.

pub mod auth;
pub mod session;

pub use auth::{
    GateRejection, OptionalUser, RequireAdmin, RequireClient, clear_current_user,
    set_current_user,
};
pub use session::create_session_layer;
