//! Balance and request storage.
//!
//! [`BalanceRepository`] is the capability the rest of the core reads
//! balances from and commits used days to. [`RequestRepository`] adds the
//! vacation requests themselves and keeps `pending_days` in step with them.
//! [`AllocationStore`] is the in-memory implementation; `vt-db` provides a
//! SQLite-backed one.
//!
//! # Atomicity
//!
//! `commit` and `commit_all` are check-and-increment operations. Implementations
//! must make the balance check and the increment a single step per
//! `(user, year)`, so that two concurrent commits cannot both pass the check
//! and overdraw the record.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::allocation::{AllocationDraw, AllocationPolicy, BalanceUpdate, YearAllocation};
use crate::request::{RequestStatus, VacationRequest};

/// Balance invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// Committing would push used days past the total.
    #[error(
        "insufficient balance for {user_id} in {year}: requested {requested} days, {remaining} remaining"
    )]
    InsufficientBalance {
        user_id: String,
        year: i32,
        requested: u32,
        remaining: u32,
    },

    /// A new total would fall below the days already used.
    #[error("total of {total_days} days for {user_id} in {year} is below the {used_days} days already used")]
    TotalBelowUsed {
        user_id: String,
        year: i32,
        total_days: u32,
        used_days: u32,
    },

    /// Carry-over larger than the total it is part of.
    #[error("carry-over of {carry_over} days exceeds the total of {total_days} for {user_id} in {year}")]
    CarryOverExceedsTotal {
        user_id: String,
        year: i32,
        carry_over: u32,
        total_days: u32,
    },
}

/// A stored request is missing or no longer pending.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestStateError {
    #[error("vacation request not found: {0}")]
    NotFound(String),

    #[error("vacation request {id} is not pending (status: {status})")]
    NotPending { id: String, status: RequestStatus },

    #[error("vacation request already exists: {0}")]
    Duplicate(String),
}

/// Errors from the in-memory [`AllocationStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Request(#[from] RequestStateError),
}

/// Rejects records that break `used <= total` or `carry_over <= total`.
pub fn check_allocation(allocation: &YearAllocation) -> Result<(), BalanceError> {
    if allocation.used_days > allocation.total_days {
        return Err(BalanceError::TotalBelowUsed {
            user_id: allocation.user_id.clone(),
            year: allocation.year,
            total_days: allocation.total_days,
            used_days: allocation.used_days,
        });
    }
    if allocation.carry_over_from_previous_year > allocation.total_days {
        return Err(BalanceError::CarryOverExceedsTotal {
            user_id: allocation.user_id.clone(),
            year: allocation.year,
            carry_over: allocation.carry_over_from_previous_year,
            total_days: allocation.total_days,
        });
    }
    Ok(())
}

/// Sums draw days per year, skipping empty draws.
pub fn days_per_year(draws: &[AllocationDraw]) -> BTreeMap<i32, u32> {
    let mut per_year = BTreeMap::new();
    for draw in draws.iter().filter(|draw| draw.days > 0) {
        let days: &mut u32 = per_year.entry(draw.year).or_insert(0);
        *days = days.saturating_add(draw.days);
    }
    per_year
}

/// Read/write access to per-user, per-year balances.
pub trait BalanceRepository {
    type Error: std::error::Error + From<BalanceError> + Send + Sync + 'static;

    /// All records for a user, ordered by ascending year.
    fn user_allocations(&self, user_id: &str) -> Result<Vec<YearAllocation>, Self::Error>;

    /// The record for `(user_id, year)`. Never creates one.
    fn allocation(&self, user_id: &str, year: i32) -> Result<Option<YearAllocation>, Self::Error>;

    /// Returns the record for `(user_id, year)`, creating it with the default
    /// entitlement if it does not exist.
    fn ensure_allocation(&self, user_id: &str, year: i32) -> Result<YearAllocation, Self::Error>;

    /// Inserts or replaces a record after checking its invariants.
    fn put_allocation(&self, allocation: &YearAllocation) -> Result<(), Self::Error>;

    /// Applies `update` to `(user_id, year)` in one step, creating an unused
    /// record if needed. Used and pending days keep their stored values.
    /// Fails if the total would drop below the days already used.
    fn set_balance(
        &self,
        user_id: &str,
        year: i32,
        update: &BalanceUpdate,
    ) -> Result<YearAllocation, Self::Error>;

    /// Sets only the total for `(user_id, year)`. See [`set_balance`](Self::set_balance).
    fn set_total_days(
        &self,
        user_id: &str,
        year: i32,
        total_days: u32,
    ) -> Result<YearAllocation, Self::Error> {
        self.set_balance(user_id, year, &BalanceUpdate::total(total_days))
    }

    /// Marks `days` as used in `(user_id, year)`.
    ///
    /// A missing record is created with the default entitlement, provided
    /// `days` fits in it.
    fn commit(&self, user_id: &str, year: i32, days: u32) -> Result<YearAllocation, Self::Error>;

    /// Commits a whole distribution at once. Either every year is updated or
    /// none is.
    fn commit_all(
        &self,
        user_id: &str,
        draws: &[AllocationDraw],
    ) -> Result<Vec<YearAllocation>, Self::Error>;

    /// Years with days remaining, newest first.
    fn available_years(&self, user_id: &str) -> Result<Vec<i32>, Self::Error> {
        let mut years: Vec<i32> = self
            .user_allocations(user_id)?
            .iter()
            .filter(|allocation| allocation.remaining_days() > 0)
            .map(|allocation| allocation.year)
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }
}

/// Persistence for vacation requests.
///
/// Days of a pending request are counted in `pending_days` of every drawn
/// year that has a record. Approval and rejection release them in the same
/// step that changes the request's status.
pub trait RequestRepository: BalanceRepository {
    /// Stores a new pending request and reserves its days as pending.
    fn insert_request(&self, request: &VacationRequest) -> Result<(), Self::Error>;

    fn request(&self, id: &str) -> Result<Option<VacationRequest>, Self::Error>;

    /// A user's requests, oldest first.
    fn user_requests(&self, user_id: &str) -> Result<Vec<VacationRequest>, Self::Error>;

    /// Every pending request, oldest first.
    fn pending_requests(&self) -> Result<Vec<VacationRequest>, Self::Error>;

    /// Commits the stored request's draws, releases its pending days and
    /// marks it approved, all at once. Fails without changes if the request
    /// is not pending or any year lacks the balance.
    fn approve_request(&self, id: &str) -> Result<VacationRequest, Self::Error>;

    /// Releases the request's pending days and marks it rejected.
    fn reject_request(&self, id: &str, reason: &str) -> Result<VacationRequest, Self::Error>;
}

type Key = (String, i32);

#[derive(Debug, Default)]
struct State {
    allocations: BTreeMap<Key, YearAllocation>,
    requests: BTreeMap<String, VacationRequest>,
}

impl State {
    /// Checks that `days` more can be used in `(user_id, year)` and returns
    /// the updated record without storing it.
    fn plan_commit(
        &self,
        policy: AllocationPolicy,
        user_id: &str,
        year: i32,
        days: u32,
    ) -> Result<YearAllocation, BalanceError> {
        let current = self
            .allocations
            .get(&(user_id.to_string(), year))
            .cloned()
            .unwrap_or_else(|| YearAllocation::new(user_id, year, policy.default_entitlement));

        let remaining = current.remaining_days();
        if days > remaining {
            return Err(BalanceError::InsufficientBalance {
                user_id: user_id.to_string(),
                year,
                requested: days,
                remaining,
            });
        }

        Ok(YearAllocation {
            used_days: current.used_days + days,
            ..current
        })
    }

    fn pending_request(&self, id: &str) -> Result<&VacationRequest, RequestStateError> {
        let request = self
            .requests
            .get(id)
            .ok_or_else(|| RequestStateError::NotFound(id.to_string()))?;
        if request.is_pending() {
            Ok(request)
        } else {
            Err(RequestStateError::NotPending {
                id: id.to_string(),
                status: request.status,
            })
        }
    }

    /// Adds `days` per drawn year to `pending_days` (or removes them when
    /// `release` is set). Years without a record are skipped.
    fn adjust_pending(&mut self, user_id: &str, draws: &[AllocationDraw], release: bool) {
        for (year, days) in days_per_year(draws) {
            if let Some(allocation) = self.allocations.get_mut(&(user_id.to_string(), year)) {
                allocation.pending_days = if release {
                    allocation.pending_days.saturating_sub(days)
                } else {
                    allocation.pending_days.saturating_add(days)
                };
            }
        }
    }

    fn sorted(mut requests: Vec<VacationRequest>) -> Vec<VacationRequest> {
        requests.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then_with(|| a.id.cmp(&b.id)));
        requests
    }
}

/// In-memory balance and request store.
///
/// Records are keyed by `(user_id, year)`. All mutations run under a single
/// lock, which makes each commit an atomic check-and-increment.
#[derive(Debug, Default)]
pub struct AllocationStore {
    policy: AllocationPolicy,
    state: Mutex<State>,
}

impl AllocationStore {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(State::default()),
        }
    }

    /// Builds a store preloaded with `allocations`.
    pub fn with_allocations(
        policy: AllocationPolicy,
        allocations: impl IntoIterator<Item = YearAllocation>,
    ) -> Result<Self, StoreError> {
        let store = Self::new(policy);
        for allocation in allocations {
            store.put_allocation(&allocation)?;
        }
        Ok(store)
    }

    pub const fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BalanceRepository for AllocationStore {
    type Error = StoreError;

    fn user_allocations(&self, user_id: &str) -> Result<Vec<YearAllocation>, Self::Error> {
        let state = self.state();
        let range = (user_id.to_string(), i32::MIN)..=(user_id.to_string(), i32::MAX);
        Ok(state
            .allocations
            .range(range)
            .map(|(_, allocation)| allocation.clone())
            .collect())
    }

    fn allocation(&self, user_id: &str, year: i32) -> Result<Option<YearAllocation>, Self::Error> {
        Ok(self
            .state()
            .allocations
            .get(&(user_id.to_string(), year))
            .cloned())
    }

    fn ensure_allocation(&self, user_id: &str, year: i32) -> Result<YearAllocation, Self::Error> {
        let mut state = self.state();
        let allocation = state
            .allocations
            .entry((user_id.to_string(), year))
            .or_insert_with(|| {
                tracing::info!(
                    user_id,
                    year,
                    total_days = self.policy.default_entitlement,
                    "created default allocation"
                );
                YearAllocation::new(user_id, year, self.policy.default_entitlement)
            });
        Ok(allocation.clone())
    }

    fn put_allocation(&self, allocation: &YearAllocation) -> Result<(), Self::Error> {
        check_allocation(allocation)?;
        self.state().allocations.insert(
            (allocation.user_id.clone(), allocation.year),
            allocation.clone(),
        );
        Ok(())
    }

    fn set_balance(
        &self,
        user_id: &str,
        year: i32,
        update: &BalanceUpdate,
    ) -> Result<YearAllocation, Self::Error> {
        let mut state = self.state();
        let key = (user_id.to_string(), year);
        let updated = update.apply(user_id, year, state.allocations.get(&key).cloned());
        check_allocation(&updated)?;
        state.allocations.insert(key, updated.clone());
        Ok(updated)
    }

    fn commit(&self, user_id: &str, year: i32, days: u32) -> Result<YearAllocation, Self::Error> {
        let mut state = self.state();
        let updated = state
            .plan_commit(self.policy, user_id, year, days)
            .inspect_err(|err| {
                tracing::warn!(%err, "commit rejected");
            })?;
        state
            .allocations
            .insert((user_id.to_string(), year), updated.clone());
        tracing::info!(user_id, year, days, used_days = updated.used_days, "committed days");
        Ok(updated)
    }

    fn commit_all(
        &self,
        user_id: &str,
        draws: &[AllocationDraw],
    ) -> Result<Vec<YearAllocation>, Self::Error> {
        let mut state = self.state();
        let planned = plan_all(&state, self.policy, user_id, draws)?;
        for updated in &planned {
            state
                .allocations
                .insert((user_id.to_string(), updated.year), updated.clone());
        }
        tracing::info!(user_id, years = planned.len(), "committed allocation");
        Ok(planned)
    }
}

fn plan_all(
    state: &State,
    policy: AllocationPolicy,
    user_id: &str,
    draws: &[AllocationDraw],
) -> Result<Vec<YearAllocation>, BalanceError> {
    let mut planned = Vec::new();
    for (year, days) in days_per_year(draws) {
        let updated = state
            .plan_commit(policy, user_id, year, days)
            .inspect_err(|err| {
                tracing::warn!(%err, "commit rejected, no years updated");
            })?;
        planned.push(updated);
    }
    Ok(planned)
}

impl RequestRepository for AllocationStore {
    fn insert_request(&self, request: &VacationRequest) -> Result<(), Self::Error> {
        let mut state = self.state();
        if state.requests.contains_key(&request.id) {
            return Err(RequestStateError::Duplicate(request.id.clone()).into());
        }
        if request.is_pending() {
            state.adjust_pending(&request.user_id, &request.allocations, false);
        }
        state.requests.insert(request.id.clone(), request.clone());
        Ok(())
    }

    fn request(&self, id: &str) -> Result<Option<VacationRequest>, Self::Error> {
        Ok(self.state().requests.get(id).cloned())
    }

    fn user_requests(&self, user_id: &str) -> Result<Vec<VacationRequest>, Self::Error> {
        let state = self.state();
        let requests = state
            .requests
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect();
        Ok(State::sorted(requests))
    }

    fn pending_requests(&self) -> Result<Vec<VacationRequest>, Self::Error> {
        let state = self.state();
        let requests = state
            .requests
            .values()
            .filter(|request| request.is_pending())
            .cloned()
            .collect();
        Ok(State::sorted(requests))
    }

    fn approve_request(&self, id: &str) -> Result<VacationRequest, Self::Error> {
        let mut state = self.state();
        let mut request = state.pending_request(id)?.clone();
        let planned = plan_all(&state, self.policy, &request.user_id, &request.allocations)?;

        for updated in planned {
            state
                .allocations
                .insert((request.user_id.clone(), updated.year), updated);
        }
        state.adjust_pending(&request.user_id, &request.allocations, true);
        request.status = RequestStatus::Approved;
        state.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn reject_request(&self, id: &str, reason: &str) -> Result<VacationRequest, Self::Error> {
        let mut state = self.state();
        let mut request = state.pending_request(id)?.clone();

        state.adjust_pending(&request.user_id, &request.allocations, true);
        request.status = RequestStatus::Rejected;
        request.rejection_reason = Some(reason.to_string());
        state.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }
}
