//! Balances command for showing a user's yearly vacation balances.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use vt_core::{BalanceRepository, YearAllocation};

use super::util::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct BalancesArgs {
    /// User whose balances to show.
    #[arg(long)]
    pub user: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &BalancesArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let allocations = db.user_allocations(&args.user)?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&allocations)?)?;
        return Ok(());
    }

    if allocations.is_empty() {
        writeln!(
            writer,
            "No balances for {}. Run 'vt set-balance --user {} --year <YEAR> --total <DAYS>' to add one.",
            args.user, args.user
        )?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<6} {:>6} {:>6} {:>8} {:>10} {:>11} EXPIRES",
        "YEAR", "TOTAL", "USED", "PENDING", "REMAINING", "CARRY-OVER"
    )?;
    for allocation in &allocations {
        let expires = allocation
            .expiry_date
            .map_or_else(|| "-".to_string(), |date| date.to_string());
        writeln!(
            writer,
            "{:<6} {:>6} {:>6} {:>8} {:>10} {:>11} {}",
            allocation.year,
            allocation.total_days,
            allocation.used_days,
            allocation.pending_days,
            allocation.remaining_days(),
            allocation.carry_over_from_previous_year,
            expires
        )?;
    }

    let remaining: u32 = allocations.iter().map(YearAllocation::remaining_days).sum();
    writeln!(writer, "Total remaining: {remaining} days")?;

    Ok(())
}
