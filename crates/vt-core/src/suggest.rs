//! Allocation suggestion engine.
//!
//! Distributes a requested number of days across a user's yearly balances.
//!
//! # Algorithm Summary
//!
//! 1. Keep allocations with remaining days and sort them: allocations with an
//!    expiry date first (earliest expiry first), then by ascending year.
//! 2. Pass 1 draws expiring carry-over days from each allocation that has both
//!    an expiry date and carry-over.
//! 3. Pass 2 walks the same order again and draws whatever remains, merging
//!    into the pass-1 line for the same year.
//!
//! The engine never fails. When the balances cannot cover the request it
//! returns the partial distribution and leaves rejection to the validator.

use std::cmp::Ordering;

use crate::allocation::{AllocationDraw, YearAllocation};

/// Suggests how to draw `requested_days` from `allocations`.
///
/// Draws are returned in the order they were produced, each with `days > 0`
/// and at most one line per year. Output depends only on the inputs, so two
/// calls with unchanged allocations yield identical results.
pub fn suggest(allocations: &[YearAllocation], requested_days: u32) -> Vec<AllocationDraw> {
    let mut candidates: Vec<&YearAllocation> = allocations
        .iter()
        .filter(|allocation| allocation.remaining_days() > 0)
        .collect();
    candidates.sort_by(|a, b| draw_priority(a, b));

    let mut draws: Vec<AllocationDraw> = Vec::new();
    let mut still_needed = requested_days;

    // Pass 1: expiring carry-over
    for allocation in &candidates {
        if still_needed == 0 {
            break;
        }
        let Some(expiry_date) = allocation.expiry_date else {
            continue;
        };
        if allocation.carry_over_from_previous_year == 0 {
            continue;
        }

        let already_drawn = drawn_for_year(&draws, allocation.year);
        let available = allocation.remaining_days().saturating_sub(already_drawn);
        let days = allocation
            .carry_over_from_previous_year
            .min(available)
            .min(still_needed);
        if days == 0 {
            continue;
        }

        match draws.iter_mut().find(|draw| draw.year == allocation.year) {
            Some(existing) => {
                existing.days += days;
                existing.carry_over_days += days;
            }
            None => draws.push(AllocationDraw {
                year: allocation.year,
                days,
                carry_over_days: days,
                expiry_date: Some(expiry_date),
            }),
        }
        still_needed -= days;
    }

    // Pass 2: remaining balances, same order
    for allocation in &candidates {
        if still_needed == 0 {
            break;
        }

        let already_drawn = drawn_for_year(&draws, allocation.year);
        let available = allocation.remaining_days().saturating_sub(already_drawn);
        let days = available.min(still_needed);
        if days == 0 {
            continue;
        }

        match draws.iter_mut().find(|draw| draw.year == allocation.year) {
            Some(existing) => existing.days += days,
            None => draws.push(AllocationDraw::manual(allocation.year, days)),
        }
        still_needed -= days;
    }

    let drawn: u32 = draws.iter().map(|draw| draw.days).sum();
    if drawn < requested_days {
        tracing::debug!(
            requested_days,
            drawn,
            "balances cannot cover request, returning partial suggestion"
        );
    } else {
        tracing::debug!(requested_days, lines = draws.len(), "suggested allocation");
    }

    draws
}

/// Orders allocations so soon-to-expire carry-over is spent first, then the
/// oldest balances.
fn draw_priority(a: &YearAllocation, b: &YearAllocation) -> Ordering {
    match (a.expiry_date, b.expiry_date) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a_expiry), Some(b_expiry)) => a_expiry.cmp(&b_expiry).then(a.year.cmp(&b.year)),
        (None, None) => a.year.cmp(&b.year),
    }
}

fn drawn_for_year(draws: &[AllocationDraw], year: i32) -> u32 {
    draws
        .iter()
        .filter(|draw| draw.year == year)
        .map(|draw| draw.days)
        .sum()
}
