//! Shared utilities for CLI commands.

use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, NaiveDate};
use vt_core::{AllocationDraw, HolidayLookup, NoHolidays};
use vt_db::Database;

use crate::Config;

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(db.with_policy(config.policy()))
}

/// Resolves the holiday lookup for a command.
///
/// An explicit `--calendar` wins over the configured default. With neither,
/// no day is treated as a holiday.
pub fn holiday_lookup(
    db: &Database,
    calendar: Option<&str>,
    config: &Config,
) -> Result<Box<dyn HolidayLookup>> {
    let Some(calendar_id) = calendar.or(config.default_calendar.as_deref()) else {
        return Ok(Box::new(NoHolidays));
    };
    match db.holiday_calendar(calendar_id)? {
        Some(calendar) => {
            tracing::debug!(
                calendar_id,
                holidays = calendar.holidays.len(),
                "loaded holiday calendar"
            );
            Ok(Box::new(calendar))
        }
        None => bail!("holiday calendar not found: {calendar_id}"),
    }
}

/// Parse a date as ISO 8601 (`2026-01-15`) or one of `today`, `tomorrow`, `yesterday`.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    match s.trim() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").with_context(|| {
        format!("Invalid date: {s}. Use YYYY-MM-DD (e.g., 2026-01-15), 'today', 'tomorrow' or 'yesterday'")
    })
}

/// Parse a manual draw written as `YEAR=DAYS` (e.g., `2024=3`).
pub fn parse_allocation(s: &str) -> Result<AllocationDraw> {
    let Some((year, days)) = s.split_once('=') else {
        bail!("Invalid allocation: {s}. Use YEAR=DAYS (e.g., 2024=3)");
    };
    let year: i32 = year
        .trim()
        .parse()
        .with_context(|| format!("invalid year in allocation: {s}"))?;
    let days: u32 = days
        .trim()
        .parse()
        .with_context(|| format!("invalid day count in allocation: {s}"))?;
    Ok(AllocationDraw::manual(year, days))
}

/// Renders a draw as `2024: 10 days (3 carry-over, expires 2024-03-31)`.
pub fn describe_draw(draw: &AllocationDraw) -> String {
    let mut line = format!("{}: {} days", draw.year, draw.days);
    if draw.is_carry_over() {
        match draw.expiry_date {
            Some(expiry) => line.push_str(&format!(
                " ({} carry-over, expires {expiry})",
                draw.carry_over_days
            )),
            None => line.push_str(&format!(" ({} carry-over)", draw.carry_over_days)),
        }
    }
    line
}
