//! HTTP route handlers.

pub mod admin;
pub mod approvals;
pub mod charges;
pub mod error;
pub mod exceptions;
pub mod masters;
pub mod month_lock;
pub mod reconciliation;
pub mod remittances;
pub mod uploads;
