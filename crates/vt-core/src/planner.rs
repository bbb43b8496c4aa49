//! Request workflow: count, distribute, validate, commit.
//!
//! A [`VacationPlanner`] borrows a request repository and a holiday lookup
//! and drives stored [`VacationRequest`]s from pending to approved or
//! rejected. Balances change only when an approval has passed validation.

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::allocation::AllocationDraw;
use crate::calendar::{HolidayLookup, RangeError, count_days};
use crate::request::{RequestDraft, RequestStatus, VacationRequest};
use crate::store::RequestRepository;
use crate::suggest::suggest;
use crate::validate::{ValidationError, validate};

/// Errors from the request workflow.
#[derive(Debug, Error)]
pub enum RequestError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("vacation request not found: {0}")]
    NotFound(String),

    /// The request has already been approved or rejected.
    #[error("vacation request {id} is not pending (status: {status})")]
    NotPending { id: String, status: RequestStatus },

    /// The repository failed, including commit-time balance checks.
    #[error(transparent)]
    Store(E),
}

/// Drives vacation requests against a repository and a holiday lookup.
#[derive(Debug)]
pub struct VacationPlanner<'a, R, H: ?Sized> {
    repository: &'a R,
    holidays: &'a H,
}

impl<'a, R, H> VacationPlanner<'a, R, H>
where
    R: RequestRepository,
    H: HolidayLookup + ?Sized,
{
    pub const fn new(repository: &'a R, holidays: &'a H) -> Self {
        Self {
            repository,
            holidays,
        }
    }

    /// Counts qualifying days in `[start, end]` using this planner's holidays.
    pub fn count_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        include_weekends: bool,
        include_holidays: bool,
    ) -> Result<u32, RangeError> {
        count_days(start, end, include_weekends, include_holidays, self.holidays)
    }

    /// Suggests a distribution of `days` over the user's current balances.
    pub fn suggest(&self, user_id: &str, days: u32) -> Result<Vec<AllocationDraw>, R::Error> {
        let allocations = self.repository.user_allocations(user_id)?;
        Ok(suggest(&allocations, days))
    }

    /// Creates and stores a pending request.
    ///
    /// Uses the draft's manual allocations when present, otherwise a
    /// suggestion. The distribution is not validated here; its days are
    /// reserved as pending until the request is approved or rejected.
    pub fn create_request(
        &self,
        draft: RequestDraft,
    ) -> Result<VacationRequest, RequestError<R::Error>> {
        let total_days = self.count_days(
            draft.start_date,
            draft.end_date,
            draft.include_weekends,
            draft.include_holidays,
        )?;

        let allocations = match draft.allocations {
            Some(allocations) => allocations,
            None => self
                .suggest(&draft.user_id, total_days)
                .map_err(RequestError::Store)?,
        };

        let request = VacationRequest {
            id: Uuid::new_v4().to_string(),
            user_id: draft.user_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            include_weekends: draft.include_weekends,
            include_holidays: draft.include_holidays,
            total_days,
            allocations,
            status: RequestStatus::Pending,
            requested_at: Utc::now(),
            notes: draft.notes,
            rejection_reason: None,
        };
        self.repository
            .insert_request(&request)
            .map_err(RequestError::Store)?;
        tracing::info!(
            request_id = %request.id,
            user_id = %request.user_id,
            total_days,
            "created vacation request"
        );
        Ok(request)
    }

    /// Validates the stored request against fresh balances and commits it.
    ///
    /// On any failure the request stays pending and no balance changes.
    pub fn approve(&self, id: &str) -> Result<VacationRequest, RequestError<R::Error>> {
        let request = self.pending(id)?;

        let allocations = self
            .repository
            .user_allocations(&request.user_id)
            .map_err(RequestError::Store)?;
        validate(&request.allocations, request.total_days, &allocations)?;

        let approved = self
            .repository
            .approve_request(id)
            .map_err(RequestError::Store)?;
        tracing::info!(request_id = %approved.id, "approved vacation request");
        Ok(approved)
    }

    /// Rejects a pending request. Used days are not touched.
    pub fn reject(
        &self,
        id: &str,
        reason: &str,
    ) -> Result<VacationRequest, RequestError<R::Error>> {
        self.pending(id)?;
        let rejected = self
            .repository
            .reject_request(id, reason)
            .map_err(RequestError::Store)?;
        tracing::info!(request_id = %rejected.id, "rejected vacation request");
        Ok(rejected)
    }

    fn pending(&self, id: &str) -> Result<VacationRequest, RequestError<R::Error>> {
        let request = self
            .repository
            .request(id)
            .map_err(RequestError::Store)?
            .ok_or_else(|| RequestError::NotFound(id.to_string()))?;
        if request.is_pending() {
            Ok(request)
        } else {
            Err(RequestError::NotPending {
                id: request.id,
                status: request.status,
            })
        }
    }
}
