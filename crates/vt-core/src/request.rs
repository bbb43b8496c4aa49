//! Vacation requests and their lifecycle states.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::allocation::AllocationDraw;

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// Input for creating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub include_weekends: bool,
    pub include_holidays: bool,
    /// Manual distribution. `None` asks the suggestion engine for one.
    pub allocations: Option<Vec<AllocationDraw>>,
    pub notes: Option<String>,
}

impl RequestDraft {
    /// A draft that excludes weekends and holidays and uses a suggested
    /// distribution.
    pub fn new(user_id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            start_date,
            end_date,
            include_weekends: false,
            include_holidays: false,
            allocations: None,
            notes: None,
        }
    }
}

/// A request for time off, drawn from one or more yearly balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationRequest {
    pub id: String,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub include_weekends: bool,
    pub include_holidays: bool,
    /// Qualifying days in the range.
    pub total_days: u32,
    pub allocations: Vec<AllocationDraw>,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
}

impl VacationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == RequestStatus::Approved
    }

    pub fn is_rejected(&self) -> bool {
        self.status == RequestStatus::Rejected
    }

    /// Calendar days spanned by the request, both ends included.
    pub fn duration_in_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days().abs() + 1
    }
}
