//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::balances::BalancesArgs;
use crate::commands::calendar::CalendarAction;
use crate::commands::count::CountArgs;
use crate::commands::request::RequestAction;
use crate::commands::set_balance::SetBalanceArgs;
use crate::commands::suggest::SuggestArgs;

/// Vacation day tracker.
///
/// Keeps per-year vacation balances, counts requested days against holiday
/// calendars, and distributes requests across years, spending expiring
/// carry-over first.
#[derive(Debug, Parser)]
#[command(name = "vt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show a user's balance for every year.
    Balances(BalancesArgs),

    /// Create or update a user's balance for one year.
    SetBalance(SetBalanceArgs),

    /// Count the vacation days in a date range.
    Count(CountArgs),

    /// Suggest how to draw days from a user's balances.
    Suggest(SuggestArgs),

    /// Create, approve, reject and list vacation requests.
    #[command(subcommand)]
    Request(RequestAction),

    /// Manage holiday calendars.
    #[command(subcommand)]
    Calendar(CalendarAction),
}
