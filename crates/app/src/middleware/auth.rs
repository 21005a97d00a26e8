//! Route-gating extractors.
//!
//! Each protected handler declares the section it belongs to by taking
//! [`RequireAdmin`] or [`RequireClient`]. The extractor reads the session
//! identity, resolves the profile role fresh through the authorization
//! gate, and enforces the routing policy:
//!
//! - no session: redirect to login (HTML) or 401 (API paths)
//! - authenticated, wrong section: redirect to the caller's own section,
//!   never to login - the session is still valid
//! - role could not be verified (transient storage failure after retries):
//!   redirect to login with a distinguishable `error=verification` marker

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use salon_core::Role;
use salon_core::authz::{RoleLookupError, RouteDecision};

use crate::models::{CurrentUser, session_keys};
use crate::services::authz::{DbRoleSource, GateOptions, resolve_decision};
use crate::state::AppState;

/// Landing page of the staff section.
pub const ADMIN_HOME: &str = "/admin/dashboard";

/// Landing page of the client section.
pub const CLIENT_HOME: &str = "/appointments";

/// Extractor that requires a signed-in staff member.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Extractor that requires a signed-in client.
pub struct RequireClient(pub CurrentUser);

/// Error returned when the route gate denies a request.
pub enum GateRejection {
    /// Redirect to the login page (for HTML requests).
    RedirectToLogin,
    /// Redirect to login with a "couldn't verify your account" marker.
    RedirectToVerification,
    /// Authenticated, but the section belongs to the other role; send the
    /// caller home.
    RedirectToOwnSection(&'static str),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::RedirectToVerification => {
                Redirect::to("/auth/login?error=verification").into_response()
            }
            Self::RedirectToOwnSection(home) => Redirect::to(home).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate_section(parts, state, Role::Admin).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireClient {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate_section(parts, state, Role::Client).await.map(Self)
    }
}

/// Run the route gate for one request.
async fn gate_section(
    parts: &mut Parts,
    state: &AppState,
    section: Role,
) -> Result<CurrentUser, GateRejection> {
    let is_api = parts.uri.path().starts_with("/api/");

    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(GateRejection::Unauthorized)?;

    // Get the signed-in identity from the session
    let user: Option<CurrentUser> = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    let Some(user) = user else {
        return Err(if is_api {
            GateRejection::Unauthorized
        } else {
            GateRejection::RedirectToLogin
        });
    };

    // Resolve the role fresh from the profile row through the gate.
    let roles = DbRoleSource::new(state.pool().clone());
    let resolved = resolve_decision(Some(user.id), &roles, &GateOptions::default()).await;

    match resolved.decision {
        RouteDecision::ShowAdminSection if section == Role::Admin => Ok(user),
        RouteDecision::ShowClientSection if section == Role::Client => Ok(user),
        RouteDecision::ShowAdminSection => {
            Err(GateRejection::RedirectToOwnSection(ADMIN_HOME))
        }
        RouteDecision::ShowClientSection => {
            Err(GateRejection::RedirectToOwnSection(CLIENT_HOME))
        }
        RouteDecision::ShowLogin | RouteDecision::ShowLoadingIndicator => {
            if is_api {
                return Err(GateRejection::Unauthorized);
            }
            match resolved.failure {
                Some(RoleLookupError::Unavailable(_)) => {
                    Err(GateRejection::RedirectToVerification)
                }
                _ => Err(GateRejection::RedirectToLogin),
            }
        }
    }
}

/// Extractor that optionally gets the signed-in identity.
///
/// Unlike the section gates, this performs no role resolution and never
/// rejects the request.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the signed-in identity in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the signed-in identity from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
