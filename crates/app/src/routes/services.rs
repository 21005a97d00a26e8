//! Service catalog routes (staff section).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use salon_core::ServiceId;

use crate::db::ServiceRepository;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::Service;
use crate::models::service::ServiceInput;
use crate::state::AppState;

/// Build the services router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/services", get(index).post(create))
        .route("/admin/services/new", get(new_form))
        .route("/admin/services/{id}", get(edit_form).post(update))
        .route("/admin/services/{id}/delete", post(delete))
}

// =============================================================================
// Form Types
// =============================================================================

/// Raw service form fields; validation happens in `ServiceInput::parse`.
#[derive(Debug, Deserialize)]
pub struct ServiceForm {
    pub name: String,
    pub description: String,
    pub duration: String,
    pub price: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Service view for list rendering.
#[derive(Debug, Clone)]
pub struct ServiceView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub price: String,
}

impl From<Service> for ServiceView {
    fn from(service: Service) -> Self {
        Self {
            id: service.id.as_i32(),
            name: service.name,
            description: service.description,
            duration: format!("{} mins", service.duration_minutes),
            price: service.price.display(),
        }
    }
}

/// Service list template.
#[derive(Template, WebTemplate)]
#[template(path = "services/list.html")]
pub struct ServiceListTemplate {
    pub services: Vec<ServiceView>,
}

/// Service create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "services/form.html")]
pub struct ServiceFormTemplate {
    pub heading: String,
    pub action: String,
    pub error: Option<String>,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub price: String,
}

impl ServiceFormTemplate {
    fn blank() -> Self {
        Self {
            heading: "Add Service".to_owned(),
            action: "/admin/services".to_owned(),
            error: None,
            name: String::new(),
            description: String::new(),
            duration: String::new(),
            price: String::new(),
        }
    }

    fn for_service(service: &Service) -> Self {
        Self {
            heading: "Edit Service".to_owned(),
            action: format!("/admin/services/{}", service.id),
            error: None,
            name: service.name.clone(),
            description: service.description.clone(),
            duration: service.duration_minutes.to_string(),
            price: format!("{:.2}", service.price.amount()),
        }
    }

    fn with_form(mut self, form: &ServiceForm, error: String) -> Self {
        self.error = Some(error);
        self.name = form.name.clone();
        self.description = form.description.clone();
        self.duration = form.duration.clone();
        self.price = form.price.clone();
        self
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List all services.
///
/// GET /admin/services
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<ServiceListTemplate, AppError> {
    let services = ServiceRepository::new(state.pool()).list_all().await?;

    Ok(ServiceListTemplate {
        services: services.into_iter().map(Into::into).collect(),
    })
}

/// Render the new-service form.
///
/// GET /admin/services/new
pub async fn new_form(RequireAdmin(_admin): RequireAdmin) -> impl IntoResponse {
    ServiceFormTemplate::blank()
}

/// Create a service.
///
/// POST /admin/services
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<ServiceForm>,
) -> Result<Response, AppError> {
    let input = match ServiceInput::parse(&form.name, &form.description, &form.duration, &form.price)
    {
        Ok(input) => input,
        Err(e) => {
            return Ok(ServiceFormTemplate::blank()
                .with_form(&form, e.to_string())
                .into_response());
        }
    };

    ServiceRepository::new(state.pool()).create(&input).await?;

    Ok(Redirect::to("/admin/services").into_response())
}

/// Render the edit form for a service.
///
/// GET /admin/services/{id}
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<ServiceFormTemplate, AppError> {
    let service = ServiceRepository::new(state.pool())
        .get_by_id(ServiceId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))?;

    Ok(ServiceFormTemplate::for_service(&service))
}

/// Update a service.
///
/// POST /admin/services/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<ServiceForm>,
) -> Result<Response, AppError> {
    let repo = ServiceRepository::new(state.pool());
    let service = repo
        .get_by_id(ServiceId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("service {id}")))?;

    let input = match ServiceInput::parse(&form.name, &form.description, &form.duration, &form.price)
    {
        Ok(input) => input,
        Err(e) => {
            return Ok(ServiceFormTemplate::for_service(&service)
                .with_form(&form, e.to_string())
                .into_response());
        }
    };

    repo.update(service.id, &input).await?;

    Ok(Redirect::to("/admin/services").into_response())
}

/// Delete a service.
///
/// POST /admin/services/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    ServiceRepository::new(state.pool())
        .delete(ServiceId::new(id))
        .await?;

    Ok(Redirect::to("/admin/services"))
}
