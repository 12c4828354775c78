//! Versioned API contract types.
//!
//! Each file corresponds to one API surface. Contracts are additive:
//! breaking changes get a new version module rather than edits in place.

pub mod admin_v1;
pub mod approvals_v1;
pub mod charges_v1;
pub mod masters_v1;
pub mod month_lock_v1;
pub mod recon_v1;
pub mod uploads_v1;
