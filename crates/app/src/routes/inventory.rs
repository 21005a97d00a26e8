//! Inventory routes (staff section), including usage recording.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use salon_core::InventoryItemId;

use crate::db::{InventoryRepository, RepositoryError};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::InventoryItem;
use crate::models::inventory::InventoryItemInput;
use crate::services::usage::plan_usage;
use crate::state::AppState;

/// Build the inventory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/inventory", get(index).post(create))
        .route("/admin/inventory/new", get(new_form))
        .route("/admin/inventory/usage", get(usage_form).post(record_usage))
        .route("/admin/inventory/{id}", get(edit_form).post(update))
        .route("/admin/inventory/{id}/delete", post(delete))
}

// =============================================================================
// Form Types
// =============================================================================

/// Raw inventory form fields; validation happens in
/// `InventoryItemInput::parse`.
#[derive(Debug, Deserialize)]
pub struct InventoryForm {
    pub item_name: String,
    pub quantity: String,
    pub unit_price: String,
    pub reorder_level: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Inventory item view for list rendering.
#[derive(Debug, Clone)]
pub struct InventoryItemView {
    pub id: i32,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub reorder_level: i32,
    pub low_stock: bool,
}

impl From<InventoryItem> for InventoryItemView {
    fn from(item: InventoryItem) -> Self {
        let low_stock = item.is_low_stock();
        Self {
            id: item.id.as_i32(),
            item_name: item.item_name,
            quantity: item.quantity,
            unit_price: item.unit_price.display(),
            reorder_level: item.reorder_level,
            low_stock,
        }
    }
}

/// Inventory list template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/list.html")]
pub struct InventoryListTemplate {
    pub items: Vec<InventoryItemView>,
}

/// Inventory create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/form.html")]
pub struct InventoryFormTemplate {
    pub heading: String,
    pub action: String,
    pub error: Option<String>,
    pub item_name: String,
    pub quantity: String,
    pub unit_price: String,
    pub reorder_level: String,
}

impl InventoryFormTemplate {
    fn blank() -> Self {
        Self {
            heading: "Add Inventory Item".to_owned(),
            action: "/admin/inventory".to_owned(),
            error: None,
            item_name: String::new(),
            quantity: String::new(),
            unit_price: String::new(),
            reorder_level: String::new(),
        }
    }

    fn for_item(item: &InventoryItem) -> Self {
        Self {
            heading: "Edit Inventory Item".to_owned(),
            action: format!("/admin/inventory/{}", item.id),
            error: None,
            item_name: item.item_name.clone(),
            quantity: item.quantity.to_string(),
            unit_price: format!("{:.2}", item.unit_price.amount()),
            reorder_level: item.reorder_level.to_string(),
        }
    }

    fn with_form(mut self, form: &InventoryForm, error: String) -> Self {
        self.error = Some(error);
        self.item_name = form.item_name.clone();
        self.quantity = form.quantity.clone();
        self.unit_price = form.unit_price.clone();
        self.reorder_level = form.reorder_level.clone();
        self
    }
}

/// Usage recording template.
#[derive(Template, WebTemplate)]
#[template(path = "inventory/usage.html")]
pub struct UsageTemplate {
    pub error: Option<String>,
    pub items: Vec<InventoryItemView>,
}

// =============================================================================
// CRUD Handlers
// =============================================================================

/// List all inventory items.
///
/// GET /admin/inventory
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<InventoryListTemplate, AppError> {
    let items = InventoryRepository::new(state.pool()).list_all().await?;

    Ok(InventoryListTemplate {
        items: items.into_iter().map(Into::into).collect(),
    })
}

/// Render the new-item form.
///
/// GET /admin/inventory/new
pub async fn new_form(RequireAdmin(_admin): RequireAdmin) -> impl IntoResponse {
    InventoryFormTemplate::blank()
}

/// Create an inventory item.
///
/// POST /admin/inventory
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<InventoryForm>,
) -> Result<Response, AppError> {
    let input = match InventoryItemInput::parse(
        &form.item_name,
        &form.quantity,
        &form.unit_price,
        &form.reorder_level,
    ) {
        Ok(input) => input,
        Err(e) => {
            return Ok(InventoryFormTemplate::blank()
                .with_form(&form, e.to_string())
                .into_response());
        }
    };

    InventoryRepository::new(state.pool()).create(&input).await?;

    Ok(Redirect::to("/admin/inventory").into_response())
}

/// Render the edit form for an item.
///
/// GET /admin/inventory/{id}
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<InventoryFormTemplate, AppError> {
    let item = InventoryRepository::new(state.pool())
        .get_by_id(InventoryItemId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("inventory item {id}")))?;

    Ok(InventoryFormTemplate::for_item(&item))
}

/// Update an inventory item.
///
/// POST /admin/inventory/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<InventoryForm>,
) -> Result<Response, AppError> {
    let repo = InventoryRepository::new(state.pool());
    let item = repo
        .get_by_id(InventoryItemId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("inventory item {id}")))?;

    let input = match InventoryItemInput::parse(
        &form.item_name,
        &form.quantity,
        &form.unit_price,
        &form.reorder_level,
    ) {
        Ok(input) => input,
        Err(e) => {
            return Ok(InventoryFormTemplate::for_item(&item)
                .with_form(&form, e.to_string())
                .into_response());
        }
    };

    repo.update(item.id, &input).await?;

    Ok(Redirect::to("/admin/inventory").into_response())
}

/// Delete an inventory item.
///
/// POST /admin/inventory/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    InventoryRepository::new(state.pool())
        .delete(InventoryItemId::new(id))
        .await?;

    Ok(Redirect::to("/admin/inventory"))
}

// =============================================================================
// Usage Recording
// =============================================================================

/// Prefix of the per-item quantity fields on the usage form.
const USAGE_FIELD_PREFIX: &str = "qty_";

/// Render the usage recording form.
///
/// GET /admin/inventory/usage
pub async fn usage_form(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<UsageTemplate, AppError> {
    let items = InventoryRepository::new(state.pool()).list_all().await?;

    Ok(UsageTemplate {
        error: None,
        items: items.into_iter().map(Into::into).collect(),
    })
}

/// Record usage deductions.
///
/// POST /admin/inventory/usage
///
/// The form posts one `qty_{id}` field per item. The planner validates
/// against the stock just read; the repository re-checks inside the
/// transaction, so a concurrent recording surfaces as a conflict instead
/// of negative stock.
pub async fn record_usage(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let repo = InventoryRepository::new(state.pool());
    let items = repo.list_all().await?;

    let requested: HashMap<InventoryItemId, String> = form
        .into_iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix(USAGE_FIELD_PREFIX)?.parse::<i32>().ok()?;
            Some((InventoryItemId::new(id), value))
        })
        .collect();

    let lines = match plan_usage(&items, &requested) {
        Ok(lines) => lines,
        Err(e) => {
            return Ok(UsageTemplate {
                error: Some(e.to_string()),
                items: items.into_iter().map(Into::into).collect(),
            }
            .into_response());
        }
    };

    match repo.record_usage(&lines).await {
        Ok(()) => Ok(Redirect::to("/admin/inventory").into_response()),
        Err(RepositoryError::Conflict(reason)) => {
            // Stock moved under us; re-read and let staff adjust.
            let items = repo.list_all().await?;
            Ok(UsageTemplate {
                error: Some(reason),
                items: items.into_iter().map(Into::into).collect(),
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}
