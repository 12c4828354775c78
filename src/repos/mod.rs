//! Database access layer.
//!
//! Repositories are free async functions over `PgPool` or an open
//! transaction. They return `sqlx::Error`; domain-level failures are decided
//! in the service layer.

pub mod approval_repo;
pub mod audit_repo;
pub mod charge_repo;
pub mod config_repo;
pub mod master_repo;
pub mod month_lock_repo;
pub mod recon_repo;
pub mod upload_repo;
