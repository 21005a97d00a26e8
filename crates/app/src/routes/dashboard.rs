//! Staff dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};

use crate::db::{
    AppointmentRepository, InventoryRepository, PaymentRepository, UserRepository,
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::AppointmentWithClient;
use crate::state::AppState;

/// How many recent appointments the dashboard shows.
const RECENT_APPOINTMENTS: i64 = 5;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/dashboard", get(index))
}

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub appointments: String,
    pub revenue: String,
    pub clients: String,
    pub low_stock: String,
}

/// Recent appointment view for the dashboard.
#[derive(Debug, Clone)]
pub struct RecentAppointmentView {
    pub client_name: String,
    pub service_name: String,
    pub date: String,
    pub time_slot: String,
    pub status: String,
}

impl From<AppointmentWithClient> for RecentAppointmentView {
    fn from(row: AppointmentWithClient) -> Self {
        Self {
            client_name: row.client_name,
            service_name: row.appointment.service_name,
            date: row
                .appointment
                .appointment_date
                .format("%a, %b %-d")
                .to_string(),
            time_slot: row.appointment.time_slot,
            status: row.appointment.status.to_string(),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_name: String,
    pub metrics: DashboardMetrics,
    pub recent_appointments: Vec<RecentAppointmentView>,
}

/// Render the dashboard.
///
/// GET /admin/dashboard
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<DashboardTemplate, AppError> {
    let appointments = AppointmentRepository::new(state.pool());
    let payments = PaymentRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let inventory = InventoryRepository::new(state.pool());

    let completed = appointments.count_completed().await?;
    let revenue = payments.total_revenue().await?;
    let clients = users.count_clients().await?;
    let low_stock = inventory.count_low_stock().await?;
    let recent = appointments.list_recent(RECENT_APPOINTMENTS).await?;

    Ok(DashboardTemplate {
        admin_name: admin.name,
        metrics: DashboardMetrics {
            appointments: completed.to_string(),
            revenue: revenue.display(),
            clients: clients.to_string(),
            low_stock: low_stock.to_string(),
        },
        recent_appointments: recent.into_iter().map(Into::into).collect(),
    })
}
