//! Authentication route handlers.
//!
//! Staff sign in with email and password; clients with a Google ID token
//! and a phone number. Both paths store the same minimal identity in the
//! session and publish a session-change event for active watchers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use salon_core::Role;

use crate::middleware::auth::{ADMIN_HOME, CLIENT_HOME, OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::{AppState, SessionEvent};

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/client-login", get(client_login_page).post(client_login))
        .route("/auth/logout", post(logout))
}

// =============================================================================
// Form Types
// =============================================================================

/// Staff login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Client login form data.
///
/// The device runs the interactive Google flow and posts the ID token it
/// obtained, together with the phone number the salon asks every client
/// for.
#[derive(Debug, Deserialize)]
pub struct ClientLoginForm {
    pub id_token: String,
    pub phone_number: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Map an error code from the query string to a user-facing message.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password",
        "verification" => "We couldn't verify your account. Please try again.",
        "google" => "Google sign-in failed. Please try again.",
        "phone" => "Please enter your phone number",
        "disabled" => "Google sign-in is not available right now",
        _ => "Sign-in failed. Please try again.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Staff login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Client login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/client_login.html")]
pub struct ClientLoginTemplate {
    pub error: Option<String>,
    pub google_enabled: bool,
}

// =============================================================================
// Staff Login
// =============================================================================

/// Display the staff login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(|c| error_message(c).to_owned()),
    }
}

/// Handle staff login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.pool(), state.google());

    match auth.login_with_password(&form.email, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
                name: user.full_name.clone(),
            };

            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/auth/login?error=session").into_response();
            }

            state.publish_session_event(SessionEvent::SignedIn(user.id));

            // Land on the section the resolved role allows.
            let home = match user.role {
                Role::Admin => ADMIN_HOME,
                Role::Client => CLIENT_HOME,
            };
            Redirect::to(home).into_response()
        }
        Err(e) => {
            tracing::warn!("Staff login failed: {}", e);
            Redirect::to("/auth/login?error=credentials").into_response()
        }
    }
}

// =============================================================================
// Client Login
// =============================================================================

/// Display the client login page.
pub async fn client_login_page(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ClientLoginTemplate {
        error: query.error.as_deref().map(|c| error_message(c).to_owned()),
        google_enabled: state.google().is_some(),
    }
}

/// Handle client Google sign-in.
pub async fn client_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ClientLoginForm>,
) -> Response {
    let auth = AuthService::new(state.pool(), state.google());

    match auth
        .login_with_google(&form.id_token, &form.phone_number)
        .await
    {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
                name: user.full_name.clone(),
            };

            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/auth/client-login?error=session").into_response();
            }

            state.publish_session_event(SessionEvent::SignedIn(user.id));

            Redirect::to(CLIENT_HOME).into_response()
        }
        Err(AuthError::MissingPhoneNumber) => {
            Redirect::to("/auth/client-login?error=phone").into_response()
        }
        Err(AuthError::GoogleSignInDisabled) => {
            Redirect::to("/auth/client-login?error=disabled").into_response()
        }
        Err(e) => {
            tracing::warn!("Client sign-in failed: {}", e);
            Redirect::to("/auth/client-login?error=google").into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Logout and clear session.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(user): OptionalUser,
) -> impl IntoResponse {
    // Clear the signed-in identity from the session
    let _ = clear_current_user(&session).await;

    if let Some(user) = user {
        state.publish_session_event(SessionEvent::SignedOut(user.id));
    }

    // Redirect to login page
    Redirect::to("/auth/login")
}
