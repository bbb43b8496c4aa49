//! Suggest command for previewing how a request would be drawn from balances.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use vt_core::{AllocationDraw, BalanceRepository};

use super::util::{describe_draw, open_database};
use crate::Config;

#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// User whose balances to draw from.
    #[arg(long)]
    pub user: String,

    /// Number of days to distribute.
    #[arg(long)]
    pub days: u32,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SuggestionOutput<'a> {
    user_id: &'a str,
    requested_days: u32,
    allocated_days: u32,
    draws: &'a [AllocationDraw],
}

pub fn run<W: Write>(writer: &mut W, args: &SuggestArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let allocations = db.user_allocations(&args.user)?;
    let draws = vt_core::suggest(&allocations, args.days);
    let allocated_days: u32 = draws.iter().map(|draw| draw.days).sum();

    if args.json {
        let output = SuggestionOutput {
            user_id: &args.user,
            requested_days: args.days,
            allocated_days,
            draws: &draws,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Suggested allocation for {} ({} days):",
        args.user, args.days
    )?;
    if allocated_days < args.days && draws.is_empty() {
        writeln!(writer, "  (nothing available)")?;
    }
    for draw in &draws {
        writeln!(writer, "  {}", describe_draw(draw))?;
    }
    if allocated_days < args.days {
        writeln!(
            writer,
            "Only {allocated_days} of {} days are available; {} days short.",
            args.days,
            args.days - allocated_days
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

    fn seeded_config(temp: &tempfile::TempDir) -> Config {
        let config = Config {
            database_path: temp.path().join("vt.db"),
            default_entitlement: 22,
            default_calendar: None,
        };
        let db = Database::open(&config.database_path).unwrap();
        db.put_allocation(&YearAllocation::new("alice", 2023, 22).with_used(20))
            .unwrap();
        db.put_allocation(
            &YearAllocation::new("alice", 2024, 25)
                .with_carry_over(3, NaiveDate::from_ymd_opt(2024, 3, 31)),
        )
        .unwrap();
        config
    }

    fn output_of(args: &SuggestArgs, config: &Config) -> String {
        let mut output = Vec::new();
        run(&mut output, args, config).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn suggest_spends_expiring_carry_over_first() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded_config(&temp);
        let args = SuggestArgs {
            user: "alice".to_string(),
            days: 10,
            json: false,
        };

        let output = output_of(&args, &config);
        assert_snapshot!(output, @r"
        Suggested allocation for alice (10 days):
          2024: 10 days (3 carry-over, expires 2024-03-31)
        ");
    }

    #[test]
    fn suggest_reports_shortfall() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded_config(&temp);
        let args = SuggestArgs {
            user: "alice".to_string(),
            days: 30,
            json: false,
        };

        let output = output_of(&args, &config);
        assert_snapshot!(output, @r"
        Suggested allocation for alice (30 days):
          2024: 25 days (3 carry-over, expires 2024-03-31)
          2023: 2 days
        Only 27 of 30 days are available; 3 days short.
        ");
    }

    #[test]
    fn suggest_for_unknown_user_allocates_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded_config(&temp);
        let args = SuggestArgs {
            user: "nobody".to_string(),
            days: 2,
            json: false,
        };

        let output = output_of(&args, &config);
        assert_snapshot!(output, @r"
        Suggested allocation for nobody (2 days):
          (nothing available)
        Only 0 of 2 days are available; 2 days short.
        ");
    }

    #[test]
    fn suggest_for_zero_days_lists_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded_config(&temp);
        let args = SuggestArgs {
            user: "alice".to_string(),
            days: 0,
            json: false,
        };

        let output = output_of(&args, &config);
        assert_snapshot!(output, @"Suggested allocation for alice (0 days):");
    }

    #[test]
    fn suggest_outputs_json() {
        let temp = tempfile::tempdir().unwrap();
        let config = seeded_config(&temp);
        let args = SuggestArgs {
            user: "alice".to_string(),
            days: 4,
            json: true,
        };

        let output = output_of(&args, &config);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["requested_days"], 4);
        assert_eq!(json["allocated_days"], 4);
        assert_eq!(json["draws"][0]["year"], 2024);
        assert_eq!(json["draws"][0]["carry_over_days"], 3);
        assert_eq!(json["draws"][0]["expiry_date"], "2024-03-31");
    }
}
