//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Route gate: redirect per authorization state
//!
//! # Auth
//! GET  /auth/login                         - Staff login page
//! POST /auth/login                         - Staff email/password sign-in
//! GET  /auth/client-login                  - Client login page (Google + phone)
//! POST /auth/client-login                  - Client Google sign-in
//! POST /auth/logout                        - Logout
//!
//! # Session decision API (navigation shell)
//! GET  /api/session                        - Current route decision (JSON)
//! GET  /api/session/watch                  - Route decision changes (SSE)
//!
//! # Admin section
//! GET  /admin/dashboard                    - Metrics + recent appointments
//! GET  /admin/services                     - Service catalog
//! GET  /admin/services/new                 - New service form
//! POST /admin/services                     - Create service
//! GET  /admin/services/{id}                - Edit service form
//! POST /admin/services/{id}                - Update service
//! POST /admin/services/{id}/delete         - Delete service
//! GET  /admin/inventory                    - Inventory list
//! GET  /admin/inventory/new                - New item form
//! POST /admin/inventory                    - Create item
//! GET  /admin/inventory/usage              - Usage recording form
//! POST /admin/inventory/usage              - Record usage (transactional)
//! GET  /admin/inventory/{id}               - Edit item form
//! POST /admin/inventory/{id}               - Update item
//! POST /admin/inventory/{id}/delete        - Delete item
//! GET  /admin/appointments                 - All appointments
//! POST /admin/appointments/{id}/status     - Advance appointment status
//!
//! # Client section
//! GET  /appointments                       - The client's appointments
//! GET  /appointments/book                  - Booking form
//! POST /appointments/book                  - Create a pending booking
//! ```

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod inventory;
pub mod services;
pub mod session_api;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::get,
};

use salon_core::authz::RouteDecision;

use crate::middleware::auth::{ADMIN_HOME, CLIENT_HOME, OptionalUser};
use crate::services::authz::{DbRoleSource, GateOptions, resolve_decision};
use crate::state::AppState;

/// Build the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .merge(auth::router())
        .merge(session_api::router())
        .merge(dashboard::router())
        .merge(services::router())
        .merge(inventory::router())
        .merge(appointments::router())
}

/// Route gate for the bare domain: send the browser to whichever section
/// its authorization state allows.
async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> impl IntoResponse {
    let roles = DbRoleSource::new(state.pool().clone());
    let resolved =
        resolve_decision(user.map(|u| u.id), &roles, &GateOptions::default()).await;

    match resolved.decision {
        RouteDecision::ShowAdminSection => Redirect::to(ADMIN_HOME),
        RouteDecision::ShowClientSection => Redirect::to(CLIENT_HOME),
        RouteDecision::ShowLogin | RouteDecision::ShowLoadingIndicator => {
            Redirect::to("/auth/login")
        }
    }
}
