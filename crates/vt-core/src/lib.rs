//! Core domain logic for the vacation tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Calendar: counting qualifying days in a range, given weekend/holiday rules
//! - Suggestion: distributing a request across yearly balances
//! - Validation: checking a distribution against balances before commit
//! - Store: the balance and request repository capabilities and an in-memory implementation
//! - Planner: the pending → approved/rejected request workflow

mod allocation;
pub mod calendar;
mod planner;
mod request;
pub mod store;
mod suggest;
mod validate;

pub use allocation::{AllocationDraw, AllocationPolicy, BalanceUpdate, YearAllocation};
pub use calendar::{Holiday, HolidayCalendar, HolidayLookup, NoHolidays, RangeError, count_days};
pub use planner::{RequestError, VacationPlanner};
pub use request::{RequestDraft, RequestStatus, VacationRequest};
pub use store::{
    AllocationStore, BalanceError, BalanceRepository, RequestRepository, RequestStateError,
    StoreError,
};
pub use suggest::suggest;
pub use validate::{ValidationError, validate};
