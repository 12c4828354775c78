//! Billing month arithmetic and the month lock gate.
//!
//! A month key is the six-digit string YYYYMM. Locking a month freezes every
//! write path whose business date falls inside it.

use chrono::{Datelike, NaiveDate};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use crate::repos::month_lock_repo;

#[derive(Debug, Error)]
pub enum MonthKeyError {
    #[error("Invalid month key: {0} (expected YYYYMM)")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Month {0} is locked")]
    Locked(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A calendar month identified as YYYYMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn parse(raw: &str) -> Result<MonthKey, MonthKeyError> {
        if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MonthKeyError::Invalid(raw.to_string()));
        }
        let year: i32 = raw[..4].parse().map_err(|_| MonthKeyError::Invalid(raw.to_string()))?;
        let month: u32 = raw[4..].parse().map_err(|_| MonthKeyError::Invalid(raw.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::Invalid(raw.to_string()));
        }
        Ok(MonthKey { year, month })
    }

    pub fn from_date(date: NaiveDate) -> MonthKey {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn as_string(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    pub fn first_day(&self) -> NaiveDate {
        // Both components were range-checked at construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (ny, nm) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(ny, nm, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// Refuse to proceed when the month is locked. Absence of a lock row means
/// the month is open.
pub async fn ensure_month_open(pool: &PgPool, key: &MonthKey) -> Result<(), LockError> {
    let month_key = key.as_string();
    if month_lock_repo::is_locked(pool, &month_key).await? {
        return Err(LockError::Locked(month_key));
    }
    Ok(())
}

/// Same gate inside a transaction already in flight.
pub async fn ensure_month_open_tx(
    tx: &mut Transaction<'_, Postgres>,
    key: &MonthKey,
) -> Result<(), LockError> {
    let month_key = key.as_string();
    if month_lock_repo::is_locked_tx(tx, &month_key).await? {
        return Err(LockError::Locked(month_key));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_keys() {
        let key = MonthKey::parse("202501").unwrap();
        assert_eq!(key.as_string(), "202501");
        assert_eq!(key.first_day(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(key.last_day(), NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(MonthKey::parse("2025-1").is_err());
        assert!(MonthKey::parse("202513").is_err());
        assert!(MonthKey::parse("202500").is_err());
        assert!(MonthKey::parse("25011").is_err());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let key = MonthKey::parse("202412").unwrap();
        assert_eq!(key.last_day(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn february_leap_year() {
        let key = MonthKey::parse("202402").unwrap();
        assert_eq!(key.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn from_date_round_trips() {
        let d = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        assert_eq!(MonthKey::from_date(d).as_string(), "202507");
    }
}
