//! Set-balance command for creating or adjusting a yearly balance.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use vt_core::{BalanceRepository, BalanceUpdate};

use super::util::{open_database, parse_date};
use crate::Config;

#[derive(Debug, Args)]
pub struct SetBalanceArgs {
    /// User whose balance to set.
    #[arg(long)]
    pub user: String,

    /// Year of the balance.
    #[arg(long)]
    pub year: i32,

    /// Total days for the year, carry-over included.
    #[arg(long)]
    pub total: u32,

    /// Days of the total carried over from the previous year.
    #[arg(long)]
    pub carry_over: Option<u32>,

    /// Date the carried-over days expire (YYYY-MM-DD).
    #[arg(long)]
    pub expires: Option<String>,
}

/// Upserts the balance. Used days are kept; carry-over and expiry keep their
/// stored values unless given.
pub fn run<W: Write>(writer: &mut W, args: &SetBalanceArgs, config: &Config) -> Result<()> {
    let expires = args.expires.as_deref().map(parse_date).transpose()?;
    let db = open_database(config)?;

    let update = BalanceUpdate {
        total_days: args.total,
        carry_over_days: args.carry_over,
        expiry_date: expires,
    };
    let allocation = db
        .set_balance(&args.user, args.year, &update)
        .with_context(|| format!("failed to set {} balance for {}", args.year, args.user))?;
    tracing::debug!(?allocation, "stored allocation");

    writeln!(
        writer,
        "Set {} balance for {}: {} days ({} used, {} remaining)",
        allocation.year,
        allocation.user_id,
        allocation.total_days,
        allocation.used_days,
        allocation.remaining_days()
    )?;
    if allocation.carry_over_from_previous_year > 0 {
        let expires = allocation
            .expiry_date
            .map_or_else(|| "never".to_string(), |date| date.to_string());
        writeln!(
            writer,
            "Carry-over: {} days, expires {expires}",
            allocation.carry_over_from_previous_year
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use vt_core::YearAllocation;
    use vt_db::Database;

    fn config_for(temp: &tempfile::TempDir) -> Config {
        Config {
            database_path: temp.path().join("vt.db"),
            default_entitlement: 22,
            default_calendar: None,
        }
    }

    fn args(total: u32) -> SetBalanceArgs {
        SetBalanceArgs {
            user: "alice".to_string(),
            year: 2024,
            total,
            carry_over: None,
            expires: None,
        }
    }

    #[test]
    fn set_balance_creates_record_with_carry_over() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        let args = SetBalanceArgs {
            carry_over: Some(3),
            expires: Some("2024-03-31".to_string()),
            ..args(25)
        };

        let mut output = Vec::new();
        run(&mut output, &args, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Set 2024 balance for alice: 25 days (0 used, 25 remaining)
        Carry-over: 3 days, expires 2024-03-31
        ");

        let db = Database::open(&config.database_path).unwrap();
        let stored = db.allocation("alice", 2024).unwrap().unwrap();
        assert_eq!(stored.carry_over_from_previous_year, 3);
        assert_eq!(stored.expiry_date, NaiveDate::from_ymd_opt(2024, 3, 31));
    }

    #[test]
    fn set_balance_keeps_used_days_and_carry_over() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        {
            let db = Database::open(&config.database_path).unwrap();
            db.put_allocation(
                &YearAllocation::new("alice", 2024, 25)
                    .with_used(5)
                    .with_carry_over(3, NaiveDate::from_ymd_opt(2024, 3, 31)),
            )
            .unwrap();
        }

        let mut output = Vec::new();
        run(&mut output, &args(30), &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Set 2024 balance for alice: 30 days (5 used, 25 remaining)
        Carry-over: 3 days, expires 2024-03-31
        ");
    }

    #[test]
    fn set_balance_keeps_days_committed_by_another_connection() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        let other = Database::open(&config.database_path).unwrap();
        other
            .put_allocation(&YearAllocation::new("alice", 2024, 25).with_used(5))
            .unwrap();
        other.commit("alice", 2024, 3).unwrap();

        let mut output = Vec::new();
        run(&mut output, &args(30), &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @"Set 2024 balance for alice: 30 days (8 used, 22 remaining)");
        assert_eq!(other.allocation("alice", 2024).unwrap().unwrap().used_days, 8);
    }

    #[test]
    fn set_balance_rejects_total_below_used() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        {
            let db = Database::open(&config.database_path).unwrap();
            db.put_allocation(&YearAllocation::new("alice", 2024, 25).with_used(10))
                .unwrap();
        }

        let mut output = Vec::new();
        let err = run(&mut output, &args(8), &config).unwrap_err();

        assert_eq!(err.to_string(), "failed to set 2024 balance for alice");
        assert!(format!("{err:#}").contains("below the 10 days already used"));

        let db = Database::open(&config.database_path).unwrap();
        assert_eq!(db.allocation("alice", 2024).unwrap().unwrap().total_days, 25);
    }

    #[test]
    fn set_balance_rejects_bad_expiry_before_touching_the_database() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        let args = SetBalanceArgs {
            expires: Some("31/03/2024".to_string()),
            ..args(25)
        };

        let mut output = Vec::new();
        assert!(run(&mut output, &args, &config).is_err());
        assert!(!config.database_path.exists());
    }
}
