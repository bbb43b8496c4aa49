//! Count command for counting the vacation days in a date range.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use vt_core::count_days;

use super::util::{holiday_lookup, open_database, parse_date};
use crate::Config;

#[derive(Debug, Args)]
pub struct CountArgs {
    /// First day of the range (YYYY-MM-DD, today, tomorrow, yesterday).
    #[arg(long)]
    pub start: String,

    /// Last day of the range, inclusive.
    #[arg(long)]
    pub end: String,

    /// Count Saturdays and Sundays.
    #[arg(long)]
    pub include_weekends: bool,

    /// Count holidays from the calendar.
    #[arg(long)]
    pub include_holidays: bool,

    /// Holiday calendar to use instead of the configured default.
    #[arg(long)]
    pub calendar: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &CountArgs, config: &Config) -> Result<()> {
    let start = parse_date(&args.start)?;
    let end = parse_date(&args.end)?;

    let db = open_database(config)?;
    let holidays = holiday_lookup(&db, args.calendar.as_deref(), config)?;
    let days = count_days(
        start,
        end,
        args.include_weekends,
        args.include_holidays,
        &*holidays,
    )?;

    writeln!(writer, "{start} to {end}: {days} vacation days")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use vt_core::{Holiday, HolidayCalendar};
    use vt_db::Database;

    fn config_for(temp: &tempfile::TempDir) -> Config {
        let config = Config {
            database_path: temp.path().join("vt.db"),
            default_entitlement: 22,
            default_calendar: None,
        };
        let mut db = Database::open(&config.database_path).unwrap();
        let mut calendar = HolidayCalendar::new("es", "Spain", "ES");
        calendar.add_holiday(Holiday {
            id: "constitution".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 6).unwrap(),
            name: "Constitution Day".to_string(),
            is_local: false,
        });
        db.create_calendar(&calendar).unwrap();
        config
    }

    fn args(start: &str, end: &str) -> CountArgs {
        CountArgs {
            start: start.to_string(),
            end: end.to_string(),
            include_weekends: false,
            include_holidays: false,
            calendar: None,
        }
    }

    fn output_of(args: &CountArgs, config: &Config) -> String {
        let mut output = Vec::new();
        run(&mut output, args, config).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn count_skips_weekends_by_default() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);

        let output = output_of(&args("2024-12-02", "2024-12-08"), &config);
        assert_snapshot!(output, @"2024-12-02 to 2024-12-08: 5 vacation days");
    }

    #[test]
    fn count_skips_calendar_holidays() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        let args = CountArgs {
            calendar: Some("es".to_string()),
            ..args("2024-12-02", "2024-12-08")
        };

        let output = output_of(&args, &config);
        assert_snapshot!(output, @"2024-12-02 to 2024-12-08: 4 vacation days");
    }

    #[test]
    fn count_uses_default_calendar_and_inclusion_flags() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            default_calendar: Some("es".to_string()),
            ..config_for(&temp)
        };
        let args = CountArgs {
            include_weekends: true,
            include_holidays: true,
            ..args("2024-12-02", "2024-12-08")
        };

        let output = output_of(&args, &config);
        assert_snapshot!(output, @"2024-12-02 to 2024-12-08: 7 vacation days");
    }

    #[test]
    fn count_rejects_reversed_range() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);

        let mut output = Vec::new();
        let err = run(&mut output, &args("2024-12-08", "2024-12-02"), &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid date range: end 2024-12-02 is before start 2024-12-08"
        );
    }

    #[test]
    fn count_reports_unknown_calendar() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        let args = CountArgs {
            calendar: Some("fr".to_string()),
            ..args("2024-12-02", "2024-12-08")
        };

        let mut output = Vec::new();
        let err = run(&mut output, &args, &config).unwrap_err();
        assert_eq!(err.to_string(), "holiday calendar not found: fr");
    }
}
