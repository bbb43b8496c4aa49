//! Calendar commands for managing holiday calendars.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Subcommand;
use uuid::Uuid;
use vt_core::{Holiday, HolidayCalendar};

use super::util::{open_database, parse_date};
use crate::Config;

/// Calendar subcommands.
#[derive(Debug, Subcommand)]
pub enum CalendarAction {
    /// Create an empty holiday calendar.
    Create {
        /// Calendar ID (e.g., es-md).
        id: String,

        /// Display name.
        #[arg(long)]
        name: String,

        /// Country code.
        #[arg(long)]
        country: String,

        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        locality: Option<String>,
    },

    /// Add a holiday to a calendar.
    Add {
        /// Calendar ID.
        calendar: String,

        /// Date of the holiday (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Name of the holiday.
        #[arg(long)]
        name: String,

        /// Mark as a regional or local holiday.
        #[arg(long)]
        local: bool,

        /// Holiday ID. Generated when omitted.
        #[arg(long)]
        id: Option<String>,
    },

    /// Remove a holiday from a calendar.
    Remove {
        /// Calendar ID.
        calendar: String,

        /// Holiday ID.
        holiday: String,
    },

    /// List calendars, or the holidays of one calendar.
    List {
        /// Calendar whose holidays to list.
        calendar: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub fn run<W: Write>(writer: &mut W, action: &CalendarAction, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;

    match action {
        CalendarAction::Create {
            id,
            name,
            country,
            region,
            locality,
        } => {
            if db.holiday_calendar(id)?.is_some() {
                bail!("holiday calendar already exists: {id}");
            }
            let calendar = HolidayCalendar {
                region: region.clone(),
                locality: locality.clone(),
                ..HolidayCalendar::new(id, name, country)
            };
            db.create_calendar(&calendar)?;
            writeln!(writer, "Created calendar {id} ({name})")?;
        }
        CalendarAction::Add {
            calendar,
            date,
            name,
            local,
            id,
        } => {
            let holiday = Holiday {
                id: id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                date: parse_date(date)?,
                name: name.clone(),
                is_local: *local,
            };
            db.add_holiday(calendar, &holiday)?;
            writeln!(
                writer,
                "Added {} on {} to {calendar} (id: {})",
                holiday.name, holiday.date, holiday.id
            )?;
        }
        CalendarAction::Remove { calendar, holiday } => {
            if db.remove_holiday(calendar, holiday)? {
                writeln!(writer, "Removed holiday {holiday} from {calendar}")?;
            } else {
                writeln!(writer, "No holiday {holiday} in {calendar}")?;
            }
        }
        CalendarAction::List {
            calendar: Some(calendar_id),
            json,
        } => {
            let Some(calendar) = db.holiday_calendar(calendar_id)? else {
                bail!("holiday calendar not found: {calendar_id}");
            };
            if *json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&calendar)?)?;
            } else {
                write_holidays(writer, &calendar)?;
            }
        }
        CalendarAction::List {
            calendar: None,
            json,
        } => {
            let calendars = db.list_calendars()?;
            if *json {
                writeln!(writer, "{}", serde_json::to_string_pretty(&calendars)?)?;
            } else {
                write_calendars(writer, &calendars)?;
            }
        }
    }

    Ok(())
}

fn write_calendars<W: Write>(writer: &mut W, calendars: &[HolidayCalendar]) -> Result<()> {
    if calendars.is_empty() {
        writeln!(
            writer,
            "No calendars yet. Run 'vt calendar create <ID> --name <NAME> --country <CODE>' to add one."
        )?;
        return Ok(());
    }

    writeln!(writer, "{:<12} {:<24} {:<8} HOLIDAYS", "ID", "NAME", "COUNTRY")?;
    for calendar in calendars {
        writeln!(
            writer,
            "{:<12} {:<24} {:<8} {}",
            calendar.id,
            calendar.name,
            calendar.country,
            calendar.holidays.len()
        )?;
    }
    Ok(())
}

fn write_holidays<W: Write>(writer: &mut W, calendar: &HolidayCalendar) -> Result<()> {
    writeln!(writer, "{} ({})", calendar.name, calendar.id)?;
    if calendar.holidays.is_empty() {
        writeln!(writer, "  (no holidays)")?;
    }
    for holiday in &calendar.holidays {
        let scope = if holiday.is_local { " [local]" } else { "" };
        writeln!(
            writer,
            "  {} {}{scope} (id: {})",
            holiday.date, holiday.name, holiday.id
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn config_for(temp: &tempfile::TempDir) -> Config {
        Config {
            database_path: temp.path().join("vt.db"),
            default_entitlement: 22,
            default_calendar: None,
        }
    }

    fn run_action(action: &CalendarAction, config: &Config) -> Result<String> {
        let mut output = Vec::new();
        run(&mut output, action, config)?;
        Ok(String::from_utf8(output).unwrap())
    }

    fn create(id: &str, name: &str) -> CalendarAction {
        CalendarAction::Create {
            id: id.to_string(),
            name: name.to_string(),
            country: "ES".to_string(),
            region: None,
            locality: None,
        }
    }

    fn add(calendar: &str, id: &str, date: &str, name: &str, local: bool) -> CalendarAction {
        CalendarAction::Add {
            calendar: calendar.to_string(),
            date: date.to_string(),
            name: name.to_string(),
            local,
            id: Some(id.to_string()),
        }
    }

    #[test]
    fn calendar_lifecycle() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);

        let created = run_action(&create("es-md", "Madrid"), &config).unwrap();
        assert_snapshot!(created, @"Created calendar es-md (Madrid)");

        let added = run_action(
            &add("es-md", "isidro", "2024-05-15", "San Isidro", true),
            &config,
        )
        .unwrap();
        assert_snapshot!(added, @"Added San Isidro on 2024-05-15 to es-md (id: isidro)");
        run_action(
            &add("es-md", "xmas", "2024-12-25", "Christmas Day", false),
            &config,
        )
        .unwrap();

        let listed = run_action(
            &CalendarAction::List {
                calendar: Some("es-md".to_string()),
                json: false,
            },
            &config,
        )
        .unwrap();
        assert_snapshot!(listed, @r"
        Madrid (es-md)
          2024-05-15 San Isidro [local] (id: isidro)
          2024-12-25 Christmas Day (id: xmas)
        ");

        let removed = run_action(
            &CalendarAction::Remove {
                calendar: "es-md".to_string(),
                holiday: "isidro".to_string(),
            },
            &config,
        )
        .unwrap();
        assert_snapshot!(removed, @"Removed holiday isidro from es-md");

        let missing = run_action(
            &CalendarAction::Remove {
                calendar: "es-md".to_string(),
                holiday: "isidro".to_string(),
            },
            &config,
        )
        .unwrap();
        assert_snapshot!(missing, @"No holiday isidro in es-md");
    }

    #[test]
    fn list_shows_every_calendar() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        let list = CalendarAction::List {
            calendar: None,
            json: false,
        };

        let empty = run_action(&list, &config).unwrap();
        assert_snapshot!(empty, @"No calendars yet. Run 'vt calendar create <ID> --name <NAME> --country <CODE>' to add one.");

        run_action(&create("es", "Spain"), &config).unwrap();
        run_action(&create("es-md", "Madrid"), &config).unwrap();
        run_action(&add("es", "xmas", "2024-12-25", "Christmas Day", false), &config).unwrap();

        let listed = run_action(&list, &config).unwrap();
        assert_snapshot!(listed, @r"
        ID           NAME                     COUNTRY  HOLIDAYS
        es           Spain                    ES       1
        es-md        Madrid                   ES       0
        ");
    }

    #[test]
    fn duplicate_calendar_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);

        run_action(&create("es", "Spain"), &config).unwrap();
        let err = run_action(&create("es", "Spain again"), &config).unwrap_err();
        assert_eq!(err.to_string(), "holiday calendar already exists: es");
    }

    #[test]
    fn adding_to_unknown_calendar_fails() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);

        let err = run_action(&add("fr", "x", "2024-07-14", "Bastille Day", false), &config)
            .unwrap_err();
        assert_eq!(err.to_string(), "holiday calendar not found: fr");
    }

    #[test]
    fn generated_holiday_ids_are_unique() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(&temp);
        run_action(&create("es", "Spain"), &config).unwrap();

        for _ in 0..2 {
            let action = CalendarAction::Add {
                calendar: "es".to_string(),
                date: "2024-01-01".to_string(),
                name: "New Year".to_string(),
                local: false,
                id: None,
            };
            run_action(&action, &config).unwrap();
        }

        let json = run_action(
            &CalendarAction::List {
                calendar: Some("es".to_string()),
                json: true,
            },
            &config,
        )
        .unwrap();
        let calendar: HolidayCalendar = serde_json::from_str(&json).unwrap();
        assert_eq!(calendar.holidays.len(), 2);
        assert_ne!(calendar.holidays[0].id, calendar.holidays[1].id);
    }
}
