//! Business logic.
//!
//! Pure computation (classification, charge math, period arithmetic) lives
//! apart from orchestration so it can be tested without a database.

pub mod approvals;
pub mod canonical;
pub mod charges;
pub mod period;
pub mod recon;
pub mod uploads;
