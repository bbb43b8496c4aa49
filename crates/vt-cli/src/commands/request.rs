//! Request commands for taking days off.
//!
//! `create` counts the range, distributes it (manually via `--allocate` or by
//! suggestion) and stores a pending request whose days show up as pending in
//! the balances. `approve` re-validates the request against current balances
//! and commits it; nothing is written unless every check passes. `reject`
//! releases the pending days.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use vt_core::{
    BalanceRepository, NoHolidays, RequestDraft, RequestRepository, VacationPlanner,
    VacationRequest, validate,
};

use super::util::{describe_draw, holiday_lookup, open_database, parse_allocation, parse_date};
use crate::Config;

/// Request subcommands.
#[derive(Debug, Subcommand)]
pub enum RequestAction {
    /// Create a pending request.
    Create(CreateArgs),

    /// Approve a pending request and commit its days.
    Approve {
        /// Request ID.
        id: String,
    },

    /// Reject a pending request.
    Reject {
        /// Request ID.
        id: String,

        /// Why the request was rejected.
        #[arg(long)]
        reason: String,
    },

    /// List requests for a user, or every pending request.
    List {
        /// Only show this user's requests.
        #[arg(long)]
        user: Option<String>,

        /// Only show pending requests.
        #[arg(long)]
        pending: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// User requesting the days.
    #[arg(long)]
    pub user: String,

    /// First day off (YYYY-MM-DD, today, tomorrow, yesterday).
    #[arg(long)]
    pub start: String,

    /// Last day off, inclusive.
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

    /// Draw days from a year by hand, as YEAR=DAYS. Repeatable.
    #[arg(long = "allocate", value_name = "YEAR=DAYS")]
    pub allocations: Vec<String>,

    /// Free-form note stored with the request.
    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, action: &RequestAction, config: &Config) -> Result<()> {
    match action {
        RequestAction::Create(args) => create(writer, args, config),
        RequestAction::Approve { id } => approve(writer, id, config),
        RequestAction::Reject { id, reason } => reject(writer, id, reason, config),
        RequestAction::List {
            user,
            pending,
            json,
        } => list(writer, user.as_deref(), *pending, *json, config),
    }
}

fn create<W: Write>(writer: &mut W, args: &CreateArgs, config: &Config) -> Result<()> {
    let start_date = parse_date(&args.start)?;
    let end_date = parse_date(&args.end)?;
    let allocations = args
        .allocations
        .iter()
        .map(String::as_str)
        .map(parse_allocation)
        .collect::<Result<Vec<_>>>()?;

    let db = open_database(config)?;
    let holidays = holiday_lookup(&db, args.calendar.as_deref(), config)?;
    let planner = VacationPlanner::new(&db, &*holidays);

    let draft = RequestDraft {
        include_weekends: args.include_weekends,
        include_holidays: args.include_holidays,
        allocations: (!allocations.is_empty()).then_some(allocations),
        notes: args.notes.clone(),
        ..RequestDraft::new(&args.user, start_date, end_date)
    };
    let request = planner
        .create_request(draft)
        .with_context(|| format!("failed to create vacation request for {}", args.user))?;

    writeln!(
        writer,
        "Created request {} for {} (pending)",
        request.id, request.user_id
    )?;
    writeln!(
        writer,
        "  {} to {} ({} calendar days): {} vacation days",
        request.start_date,
        request.end_date,
        request.duration_in_days(),
        request.total_days
    )?;
    for draw in &request.allocations {
        writeln!(writer, "  {}", describe_draw(draw))?;
    }

    // Approval re-checks this, but a request that cannot pass is worth flagging now.
    let balances = db.user_allocations(&request.user_id)?;
    if let Err(err) = validate(&request.allocations, request.total_days, &balances) {
        writeln!(writer, "Warning: {err}")?;
        match err.difference() {
            Some(difference) if difference < 0 => {
                writeln!(writer, "  {} days short", difference.unsigned_abs())?;
            }
            Some(difference) => writeln!(writer, "  {difference} days over")?,
            None => {}
        }
    }

    Ok(())
}

fn approve<W: Write>(writer: &mut W, id: &str, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let Some(request) = db.request(id)? else {
        bail!("vacation request not found: {id}");
    };
    let planner = VacationPlanner::new(&db, &NoHolidays);

    let approved = planner.approve(id).with_context(|| {
        format!(
            "vacation request for {} days by {} was not approved",
            request.total_days, request.user_id
        )
    })?;

    writeln!(
        writer,
        "Approved request {} for {}: {} to {}, {} days",
        approved.id, approved.user_id, approved.start_date, approved.end_date, approved.total_days
    )?;
    for draw in &approved.allocations {
        writeln!(writer, "  {}", describe_draw(draw))?;
    }

    Ok(())
}

fn reject<W: Write>(writer: &mut W, id: &str, reason: &str, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let planner = VacationPlanner::new(&db, &NoHolidays);

    let rejected = planner.reject(id, reason)?;

    writeln!(
        writer,
        "Rejected request {} for {}: {reason}",
        rejected.id, rejected.user_id
    )?;
    Ok(())
}

fn list<W: Write>(
    writer: &mut W,
    user: Option<&str>,
    pending_only: bool,
    json: bool,
    config: &Config,
) -> Result<()> {
    let db = open_database(config)?;
    let requests = match user {
        Some(user) => {
            let mut requests = db.user_requests(user)?;
            if pending_only {
                requests.retain(VacationRequest::is_pending);
            }
            requests
        }
        None if pending_only => db.pending_requests()?,
        None => bail!("pass --user <USER> or --pending to choose which requests to list"),
    };

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&requests)?)?;
        return Ok(());
    }

    if requests.is_empty() {
        writeln!(writer, "No vacation requests.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<36} {:<10} {:<10} {:<10} {:>4}  STATUS",
        "ID", "USER", "START", "END", "DAYS"
    )?;
    for request in &requests {
        writeln!(
            writer,
            "{:<36} {:<10} {:<10} {:<10} {:>4}  {}",
            request.id,
            request.user_id,
            request.start_date,
            request.end_date,
            request.total_days,
            request.status
        )?;
    }

    Ok(())
}
