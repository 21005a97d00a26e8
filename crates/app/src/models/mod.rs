//! Domain models and session types.

pub mod appointment;
pub mod inventory;
pub mod service;
pub mod session;
pub mod user;

pub use appointment::{Appointment, AppointmentWithClient, BookingRequest};
pub use inventory::{InventoryItem, InventoryItemInput, UsageLine};
pub use service::{Service, ServiceInput};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{ClientProfile, User};
