//! Validation of a proposed distribution against current balances.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::allocation::{AllocationDraw, YearAllocation};

/// Reasons a distribution is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The draws do not add up to the requested total.
    #[error("you need to allocate exactly {requested} days, currently allocated: {allocated} days")]
    AllocationMismatch { requested: u32, allocated: u64 },

    /// A year is asked for more than it has left.
    #[error("cannot allocate {requested} days from {year}, only {remaining} remaining")]
    OverAllocation {
        year: i32,
        requested: u64,
        remaining: u32,
    },

    /// No draw takes any days.
    #[error("you need to allocate days from at least one year")]
    EmptyAllocation,
}

impl ValidationError {
    /// Allocated minus requested for a mismatch: negative is a shortfall,
    /// positive an excess.
    pub fn difference(&self) -> Option<i64> {
        match self {
            Self::AllocationMismatch {
                requested,
                allocated,
            } => {
                let allocated = i64::try_from(*allocated).unwrap_or(i64::MAX);
                Some(allocated - i64::from(*requested))
            }
            _ => None,
        }
    }
}

/// Checks `draws` against `requested_days` and the user's `allocations`.
///
/// Rules are checked in order and the first failure wins:
/// 1. the draws sum exactly to `requested_days`;
/// 2. no year is drawn beyond its remaining balance (draws for the same year
///    are added together; a year with no allocation has nothing remaining);
/// 3. at least one draw takes a positive number of days.
///
/// This is a pure check. Nothing is committed.
pub fn validate(
    draws: &[AllocationDraw],
    requested_days: u32,
    allocations: &[YearAllocation],
) -> Result<(), ValidationError> {
    let allocated: u64 = draws.iter().map(|draw| u64::from(draw.days)).sum();
    if allocated != u64::from(requested_days) {
        return Err(ValidationError::AllocationMismatch {
            requested: requested_days,
            allocated,
        });
    }

    let mut per_year: BTreeMap<i32, u64> = BTreeMap::new();
    for draw in draws {
        *per_year.entry(draw.year).or_insert(0) += u64::from(draw.days);
    }

    for draw in draws {
        let requested = per_year.get(&draw.year).copied().unwrap_or_default();
        let remaining = allocations
            .iter()
            .find(|allocation| allocation.year == draw.year)
            .map_or(0, YearAllocation::remaining_days);
        if requested > u64::from(remaining) {
            return Err(ValidationError::OverAllocation {
                year: draw.year,
                requested,
                remaining,
            });
        }
    }

    if !draws.iter().any(|draw| draw.days > 0) {
        return Err(ValidationError::EmptyAllocation);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::suggest;

    fn allocation(year: i32, total: u32, used: u32) -> YearAllocation {
        YearAllocation::new("user1", year, total).with_used(used)
    }

    #[test]
    fn exact_distribution_passes() {
        let allocations = vec![allocation(2023, 22, 20), allocation(2024, 20, 0)];
        let draws = vec![AllocationDraw::manual(2023, 2), AllocationDraw::manual(2024, 3)];

        assert_eq!(validate(&draws, 5, &allocations), Ok(()));
    }

    #[test]
    fn shortfall_is_a_mismatch() {
        let allocations = vec![allocation(2024, 25, 0)];
        let draws = vec![AllocationDraw::manual(2024, 3)];

        let err = validate(&draws, 5, &allocations).unwrap_err();

        assert_eq!(
            err,
            ValidationError::AllocationMismatch {
                requested: 5,
                allocated: 3,
            }
        );
        assert_eq!(err.difference(), Some(-2));
    }

    #[test]
    fn excess_is_a_mismatch() {
        let allocations = vec![allocation(2024, 25, 0)];
        let draws = vec![AllocationDraw::manual(2024, 7)];

        let err = validate(&draws, 5, &allocations).unwrap_err();

        assert_eq!(err.difference(), Some(2));
        assert_eq!(
            err.to_string(),
            "you need to allocate exactly 5 days, currently allocated: 7 days"
        );
    }

    #[test]
    fn draw_beyond_remaining_is_over_allocation() {
        let allocations = vec![allocation(2023, 22, 20), allocation(2024, 20, 0)];
        let draws = vec![AllocationDraw::manual(2023, 4), AllocationDraw::manual(2024, 1)];

        let err = validate(&draws, 5, &allocations).unwrap_err();

        assert_eq!(
            err,
            ValidationError::OverAllocation {
                year: 2023,
                requested: 4,
                remaining: 2,
            }
        );
        assert_eq!(err.difference(), None);
        assert_eq!(
            err.to_string(),
            "cannot allocate 4 days from 2023, only 2 remaining"
        );
    }

    #[test]
    fn split_lines_for_one_year_are_summed() {
        let allocations = vec![allocation(2024, 20, 0)];
        let draws = vec![
            AllocationDraw::manual(2024, 12),
            AllocationDraw::manual(2024, 12),
        ];

        let err = validate(&draws, 24, &allocations).unwrap_err();

        assert!(matches!(
            err,
            ValidationError::OverAllocation {
                year: 2024,
                requested: 24,
                remaining: 20,
            }
        ));
    }

    #[test]
    fn unknown_year_has_nothing_remaining() {
        let allocations = vec![allocation(2024, 20, 0)];
        let draws = vec![AllocationDraw::manual(2030, 1)];

        let err = validate(&draws, 1, &allocations).unwrap_err();

        assert!(matches!(
            err,
            ValidationError::OverAllocation {
                year: 2030,
                remaining: 0,
                ..
            }
        ));
    }

    #[test]
    fn zero_request_with_no_positive_draw_is_empty() {
        let allocations = vec![allocation(2024, 20, 20)];

        assert_eq!(
            validate(&[], 0, &allocations),
            Err(ValidationError::EmptyAllocation)
        );
        assert_eq!(
            validate(&[AllocationDraw::manual(2024, 0)], 0, &allocations),
            Err(ValidationError::EmptyAllocation)
        );
    }

    #[test]
    fn mismatch_is_reported_before_over_allocation() {
        let allocations = vec![allocation(2024, 20, 19)];
        let draws = vec![AllocationDraw::manual(2024, 3)];

        let err = validate(&draws, 5, &allocations).unwrap_err();

        assert!(matches!(err, ValidationError::AllocationMismatch { .. }));
    }

    #[test]
    fn partial_suggestion_fails_validation() {
        let allocations = vec![allocation(2023, 22, 20), allocation(2024, 25, 22)];

        let draws = suggest(&allocations, 10);
        let err = validate(&draws, 10, &allocations).unwrap_err();

        assert_eq!(
            err,
            ValidationError::AllocationMismatch {
                requested: 10,
                allocated: 5,
            }
        );
    }

    #[test]
    fn full_suggestion_passes_validation() {
        let allocations = vec![
            allocation(2024, 25, 5).with_carry_over(
                2,
                chrono::NaiveDate::from_ymd_opt(2024, 7, 1),
            ),
            allocation(2025, 25, 0),
        ];

        let draws = suggest(&allocations, 30);

        assert_eq!(validate(&draws, 30, &allocations), Ok(()));
    }
}
