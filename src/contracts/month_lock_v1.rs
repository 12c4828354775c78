//! Month Lock V1 Contract Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthLockRequest {
    /// Month to lock, as YYYYMM
    pub month_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthLockResponse {
    pub month_key: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthLockRow {
    pub lock_id: i64,
    pub month_key: String,
    pub status: String,
    pub locked_by: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
}
