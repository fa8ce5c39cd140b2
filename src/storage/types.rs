//! Core data types for the storage layer.
//!
//! This module defines the records flowing through the two components:
//!
//! - [`SaleRecord`]: wire-shaped sale as submitted by a point-of-sale client
//! - [`Sale`]: validated, canonical sale row
//! - [`Granularity`] / [`Period`]: report resolution and the validated key
//!   identifying which day/month/year to report on
//!
//! Validation lives here so both components reject malformed input before
//! any storage access happens.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Input that failed validation. Surfaced to callers as a client error; no
/// storage access is attempted once one of these is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Report type is not one of DAILY, MONTHLY, YEARLY.
    #[error("invalid report type: {0:?}")]
    InvalidReportType(String),

    /// Period key does not match the granularity's calendar shape.
    #[error("invalid date {key:?} for {granularity} report")]
    InvalidPeriodKey { granularity: Granularity, key: String },

    /// Page number is not a positive integer.
    #[error("page must be a positive integer")]
    InvalidPage,

    /// Page size is not a positive integer.
    #[error("page_size must be a positive integer")]
    InvalidPageSize,

    /// Sale date string is not in a recognized format.
    #[error("sale {id}: unrecognized date {date:?}")]
    InvalidSaleDate { id: i64, date: String },

    /// Sale amount is negative or not a finite number.
    #[error("sale {id}: amount must be a non-negative number")]
    InvalidAmount { id: i64 },
}

// =============================================================================
// Sales
// =============================================================================

/// A sale as submitted by a client, prior to validation.
///
/// The `date` field is free-form text here; [`SaleRecord::normalize`]
/// converts it to the canonical calendar date or rejects the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Client-generated identifier, stable across resubmissions.
    pub id: i64,
    /// Transaction date string (`YYYY-MM-DD`, or legacy `MM/DD/YYYY`).
    pub date: String,
    /// Operator identifier.
    pub cashier: String,
    /// Item identifier.
    pub product: String,
    /// Monetary value.
    pub amount: f64,
}

impl SaleRecord {
    /// Validate the record and convert it into a canonical [`Sale`].
    ///
    /// The resulting sale always carries `synced = true`: normalization is
    /// only reachable through the ingestion path.
    pub fn normalize(self) -> Result<Sale, ValidationError> {
        let date = parse_sale_date(&self.date).ok_or_else(|| ValidationError::InvalidSaleDate {
            id: self.id,
            date: self.date.clone(),
        })?;

        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ValidationError::InvalidAmount { id: self.id });
        }

        Ok(Sale {
            id: self.id,
            date,
            cashier: self.cashier,
            product: self.product,
            amount: self.amount,
            synced: true,
        })
    }
}

/// A validated sale row.
///
/// Rows are immutable once written except through the upsert path, which
/// overwrites every mutable field and re-asserts `synced`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub id: i64,
    pub date: NaiveDate,
    pub cashier: String,
    pub product: String,
    pub amount: f64,
    pub synced: bool,
}

/// Parse a sale date in the canonical `YYYY-MM-DD` form, falling back to the
/// `MM/DD/YYYY` form older clients still send. Storage is always canonical.
pub fn parse_sale_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

// =============================================================================
// Report periods
// =============================================================================

/// Calendar resolution at which report rows are grouped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Granularity {
    /// One calendar day (`YYYY-MM-DD` key).
    Daily,
    /// One calendar month (`YYYY-MM` key).
    Monthly,
    /// One calendar year (`YYYY` key).
    Yearly,
}

/// A validated period key: the specific day, month, or year being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
}

impl Period {
    /// Parse a caller-supplied key against the granularity's expected shape.
    pub fn parse(granularity: Granularity, key: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidPeriodKey {
            granularity,
            key: key.to_string(),
        };

        match granularity {
            Granularity::Daily => NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .map(Period::Day)
                .map_err(|_| invalid()),
            Granularity::Monthly => parse_month_key(key)
                .map(|(year, month)| Period::Month { year, month })
                .ok_or_else(invalid),
            Granularity::Yearly => parse_year_key(key).map(Period::Year).ok_or_else(invalid),
        }
    }

    /// The granularity this period belongs to.
    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Day(_) => Granularity::Daily,
            Period::Month { .. } => Granularity::Monthly,
            Period::Year(_) => Granularity::Yearly,
        }
    }
}

/// Parse a `YYYY-MM` month key.
fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (y, m) = key.split_once('-')?;
    if y.len() != 4 {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// Parse a `YYYY` year key.
fn parse_year_key(key: &str) -> Option<i32> {
    if key.len() != 4 {
        return None;
    }
    key.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(id: i64, date: &str, amount: f64) -> SaleRecord {
        SaleRecord {
            id,
            date: date.to_string(),
            cashier: "A".to_string(),
            product: "X".to_string(),
            amount,
        }
    }

    // =========================================================================
    // Granularity tests
    // =========================================================================

    #[test]
    fn test_granularity_from_str() {
        assert_eq!(Granularity::from_str("DAILY").unwrap(), Granularity::Daily);
        assert_eq!(
            Granularity::from_str("monthly").unwrap(),
            Granularity::Monthly
        );
        assert_eq!(
            Granularity::from_str("Yearly").unwrap(),
            Granularity::Yearly
        );
        assert!(Granularity::from_str("WEEKLY").is_err());
        assert!(Granularity::from_str("").is_err());
    }

    #[test]
    fn test_granularity_display() {
        assert_eq!(Granularity::Daily.to_string(), "DAILY");
        assert_eq!(Granularity::Monthly.as_ref(), "MONTHLY");
    }

    // =========================================================================
    // Period tests
    // =========================================================================

    #[test]
    fn test_period_daily() {
        let period = Period::parse(Granularity::Daily, "2024-03-01").unwrap();
        assert_eq!(
            period,
            Period::Day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );

        assert!(Period::parse(Granularity::Daily, "2024-03").is_err());
        assert!(Period::parse(Granularity::Daily, "03/01/2024").is_err());
        assert!(Period::parse(Granularity::Daily, "2024-02-30").is_err());
    }

    #[test]
    fn test_period_monthly() {
        let period = Period::parse(Granularity::Monthly, "2024-03").unwrap();
        assert_eq!(
            period,
            Period::Month {
                year: 2024,
                month: 3
            }
        );

        assert!(Period::parse(Granularity::Monthly, "2024").is_err());
        assert!(Period::parse(Granularity::Monthly, "2024-13").is_err());
        assert!(Period::parse(Granularity::Monthly, "2024-03-01").is_err());
        assert!(Period::parse(Granularity::Monthly, "24-03").is_err());
    }

    #[test]
    fn test_period_yearly() {
        assert_eq!(
            Period::parse(Granularity::Yearly, "2024").unwrap(),
            Period::Year(2024)
        );

        assert!(Period::parse(Granularity::Yearly, "24").is_err());
        assert!(Period::parse(Granularity::Yearly, "2024-03").is_err());
        assert!(Period::parse(Granularity::Yearly, "year").is_err());
    }

    // =========================================================================
    // Sale normalization tests
    // =========================================================================

    #[test]
    fn test_normalize_iso_date() {
        let sale = record(1, "2024-03-01", 10.0).normalize().unwrap();
        assert_eq!(sale.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(sale.synced);
    }

    #[test]
    fn test_normalize_legacy_date() {
        // Older clients send MM/DD/YYYY; storage stays canonical.
        let sale = record(2, "03/01/2024", 5.0).normalize().unwrap();
        assert_eq!(sale.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_normalize_rejects_bad_date() {
        let err = record(3, "yesterday", 1.0).normalize().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSaleDate { id: 3, .. }));
    }

    #[test]
    fn test_normalize_rejects_bad_amount() {
        let err = record(4, "2024-03-01", -0.01).normalize().unwrap_err();
        assert_eq!(err, ValidationError::InvalidAmount { id: 4 });

        let err = record(5, "2024-03-01", f64::NAN).normalize().unwrap_err();
        assert_eq!(err, ValidationError::InvalidAmount { id: 5 });

        // Zero is a legal amount (voided/comped line).
        assert!(record(6, "2024-03-01", 0.0).normalize().is_ok());
    }
}
