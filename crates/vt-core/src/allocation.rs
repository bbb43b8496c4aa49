//! Per-year vacation balances and the draws made against them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Policy applied when a store has to create a balance record on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPolicy {
    /// Total days given to a `(user, year)` record created by
    /// `ensure_allocation` or by a first commit.
    /// Default: 22.
    pub default_entitlement: u32,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            default_entitlement: 22,
        }
    }
}

/// One user's vacation balance for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearAllocation {
    pub user_id: String,
    pub year: i32,

    /// Base allocation plus carry-over.
    pub total_days: u32,

    /// Days already consumed. Never exceeds `total_days`.
    pub used_days: u32,

    /// Days requested but not yet approved.
    pub pending_days: u32,

    /// Days carried over from the previous year. Never exceeds `total_days`.
    pub carry_over_from_previous_year: u32,

    /// Deadline for consuming the carried-over days. `None` means no expiry.
    pub expiry_date: Option<NaiveDate>,
}

impl YearAllocation {
    /// Creates an unused allocation with no carry-over.
    pub fn new(user_id: impl Into<String>, year: i32, total_days: u32) -> Self {
        Self {
            user_id: user_id.into(),
            year,
            total_days,
            used_days: 0,
            pending_days: 0,
            carry_over_from_previous_year: 0,
            expiry_date: None,
        }
    }

    #[must_use]
    pub fn with_used(mut self, used_days: u32) -> Self {
        self.used_days = used_days;
        self
    }

    /// Marks `days` of the total as carried over, optionally expiring on `expiry_date`.
    #[must_use]
    pub fn with_carry_over(mut self, days: u32, expiry_date: Option<NaiveDate>) -> Self {
        self.carry_over_from_previous_year = days;
        self.expiry_date = expiry_date;
        self
    }

    /// Days still available: `total_days - used_days`.
    pub const fn remaining_days(&self) -> u32 {
        self.total_days.saturating_sub(self.used_days)
    }
}

/// New balance figures for one `(user, year)`.
///
/// `None` keeps the stored value. Used and pending days are never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub total_days: u32,
    pub carry_over_days: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
}

impl BalanceUpdate {
    /// Changes only the total.
    pub const fn total(total_days: u32) -> Self {
        Self {
            total_days,
            carry_over_days: None,
            expiry_date: None,
        }
    }

    /// Applies the update to `current`, or to a new unused record when there is none.
    pub fn apply(&self, user_id: &str, year: i32, current: Option<YearAllocation>) -> YearAllocation {
        match current {
            Some(current) => YearAllocation {
                total_days: self.total_days,
                carry_over_from_previous_year: self
                    .carry_over_days
                    .unwrap_or(current.carry_over_from_previous_year),
                expiry_date: self.expiry_date.or(current.expiry_date),
                ..current
            },
            None => YearAllocation::new(user_id, year, self.total_days)
                .with_carry_over(self.carry_over_days.unwrap_or(0), self.expiry_date),
        }
    }
}

/// A number of days attributed to a specific year.
///
/// Produced by the suggestion engine or entered manually, then checked by
/// [`validate`](crate::validate) before anything is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationDraw {
    pub year: i32,
    pub days: u32,

    /// Portion of `days` taken from expiring carry-over.
    pub carry_over_days: u32,

    /// Expiry of the carry-over portion, if any.
    pub expiry_date: Option<NaiveDate>,
}

impl AllocationDraw {
    /// A draw entered by hand, with no carry-over attribution.
    pub const fn manual(year: i32, days: u32) -> Self {
        Self {
            year,
            days,
            carry_over_days: 0,
            expiry_date: None,
        }
    }

    pub const fn is_carry_over(&self) -> bool {
        self.carry_over_days > 0
    }
}
