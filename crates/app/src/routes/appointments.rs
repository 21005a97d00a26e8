//! Appointment routes: client booking/listing and staff management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use salon_core::{AppointmentId, AppointmentStatus};

use crate::db::{AppointmentRepository, PaymentRepository, ServiceRepository};
use crate::error::AppError;
use crate::middleware::{RequireAdmin, RequireClient};
use crate::models::appointment::{BookingRequest, TIME_SLOTS, booking_dates};
use crate::models::{Appointment, AppointmentWithClient};
use crate::state::AppState;

/// Build the appointments router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Client section
        .route("/appointments", get(index))
        .route("/appointments/book", get(book_form).post(book))
        // Staff section
        .route("/admin/appointments", get(admin_index))
        .route("/admin/appointments/{id}/status", post(set_status))
}

// =============================================================================
// Views
// =============================================================================

/// Appointment view for client list rendering.
#[derive(Debug, Clone)]
pub struct AppointmentView {
    pub service_name: String,
    pub date: String,
    pub time_slot: String,
    pub status: String,
}

impl From<Appointment> for AppointmentView {
    fn from(appointment: Appointment) -> Self {
        Self {
            service_name: appointment.service_name,
            date: appointment
                .appointment_date
                .format("%a, %b %-d, %Y")
                .to_string(),
            time_slot: appointment.time_slot,
            status: appointment.status.to_string(),
        }
    }
}

/// Appointment view for the staff list, with the allowed next steps.
#[derive(Debug, Clone)]
pub struct AdminAppointmentView {
    pub id: i32,
    pub client_name: String,
    pub service_name: String,
    pub date: String,
    pub time_slot: String,
    pub status: String,
    pub can_confirm: bool,
    pub can_complete: bool,
    pub can_cancel: bool,
}

impl From<AppointmentWithClient> for AdminAppointmentView {
    fn from(row: AppointmentWithClient) -> Self {
        let status = row.appointment.status;
        Self {
            id: row.appointment.id.as_i32(),
            client_name: row.client_name,
            service_name: row.appointment.service_name,
            date: row
                .appointment
                .appointment_date
                .format("%a, %b %-d, %Y")
                .to_string(),
            time_slot: row.appointment.time_slot,
            status: status.to_string(),
            can_confirm: status.can_transition_to(AppointmentStatus::Confirmed),
            can_complete: status.can_transition_to(AppointmentStatus::Completed),
            can_cancel: status.can_transition_to(AppointmentStatus::Cancelled),
        }
    }
}

/// A selectable service on the booking form.
#[derive(Debug, Clone)]
pub struct BookableServiceView {
    pub name: String,
    pub summary: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Client appointment list template.
#[derive(Template, WebTemplate)]
#[template(path = "appointments/list.html")]
pub struct AppointmentListTemplate {
    pub appointments: Vec<AppointmentView>,
}

/// Booking form template.
#[derive(Template, WebTemplate)]
#[template(path = "appointments/book.html")]
pub struct BookingTemplate {
    pub error: Option<String>,
    pub services: Vec<BookableServiceView>,
    pub dates: Vec<String>,
    pub time_slots: Vec<String>,
}

/// Staff appointment list template.
#[derive(Template, WebTemplate)]
#[template(path = "appointments/admin_list.html")]
pub struct AdminAppointmentListTemplate {
    pub appointments: Vec<AdminAppointmentView>,
}

// =============================================================================
// Client Handlers
// =============================================================================

/// List the signed-in client's appointments.
///
/// GET /appointments
pub async fn index(
    State(state): State<AppState>,
    RequireClient(client): RequireClient,
) -> Result<AppointmentListTemplate, AppError> {
    let appointments = AppointmentRepository::new(state.pool())
        .list_for_client(client.id)
        .await?;

    Ok(AppointmentListTemplate {
        appointments: appointments.into_iter().map(Into::into).collect(),
    })
}

/// Booking form data.
#[derive(Debug, Deserialize)]
pub struct BookingForm {
    pub service_name: String,
    pub date: String,
    pub time_slot: String,
}

async fn booking_template(
    state: &AppState,
    error: Option<String>,
) -> Result<BookingTemplate, AppError> {
    let services = ServiceRepository::new(state.pool()).list_all().await?;
    let today = Utc::now().date_naive();

    Ok(BookingTemplate {
        error,
        services: services
            .into_iter()
            .map(|s| BookableServiceView {
                summary: format!("{} mins \u{2022} {}", s.duration_minutes, s.price.display()),
                name: s.name,
            })
            .collect(),
        dates: booking_dates(today)
            .into_iter()
            .map(|d: NaiveDate| d.format("%Y-%m-%d").to_string())
            .collect(),
        time_slots: TIME_SLOTS.iter().map(|&s| s.to_owned()).collect(),
    })
}

/// Render the booking form.
///
/// GET /appointments/book
pub async fn book_form(
    State(state): State<AppState>,
    RequireClient(_client): RequireClient,
) -> Result<BookingTemplate, AppError> {
    booking_template(&state, None).await
}

/// Create a pending booking.
///
/// POST /appointments/book
pub async fn book(
    State(state): State<AppState>,
    RequireClient(client): RequireClient,
    Form(form): Form<BookingForm>,
) -> Result<Response, AppError> {
    let today = Utc::now().date_naive();

    let request = match BookingRequest::parse(
        client.id,
        &form.service_name,
        &form.date,
        &form.time_slot,
        today,
    ) {
        Ok(request) => request,
        Err(e) => {
            return Ok(booking_template(&state, Some(e.to_string()))
                .await?
                .into_response());
        }
    };

    // The service must still exist in the catalog at booking time.
    let service = ServiceRepository::new(state.pool())
        .get_by_name(&request.service_name)
        .await?;
    if service.is_none() {
        return Ok(booking_template(&state, Some("Unknown service".to_owned()))
            .await?
            .into_response());
    }

    AppointmentRepository::new(state.pool()).book(&request).await?;

    Ok(Redirect::to("/appointments").into_response())
}

// =============================================================================
// Staff Handlers
// =============================================================================

/// List all appointments for staff.
///
/// GET /admin/appointments
pub async fn admin_index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<AdminAppointmentListTemplate, AppError> {
    let appointments = AppointmentRepository::new(state.pool()).list_all().await?;

    Ok(AdminAppointmentListTemplate {
        appointments: appointments.into_iter().map(Into::into).collect(),
    })
}

/// Status update form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Advance an appointment's status.
///
/// POST /admin/appointments/{id}/status
///
/// Completing an appointment records a payment at the service's current
/// price, which feeds the dashboard revenue metric.
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let next: AppointmentStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("unknown status: {}", form.status)))?;

    let repo = AppointmentRepository::new(state.pool());
    let appointment = repo
        .get_by_id(AppointmentId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))?;

    if !appointment.status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot move a {} appointment to {next}",
            appointment.status
        )));
    }

    let appointment = repo.set_status(appointment.id, next).await?;

    if next == AppointmentStatus::Completed {
        match ServiceRepository::new(state.pool())
            .get_by_name(&appointment.service_name)
            .await?
        {
            Some(service) => {
                PaymentRepository::new(state.pool())
                    .record(appointment.id, service.price)
                    .await?;
            }
            None => {
                // The service was removed from the catalog after booking;
                // the completion stands but no payment can be priced.
                tracing::warn!(
                    appointment = appointment.id.as_i32(),
                    service = %appointment.service_name,
                    "completed appointment references a service no longer in the catalog"
                );
            }
        }
    }

    Ok(Redirect::to("/admin/appointments"))
}
