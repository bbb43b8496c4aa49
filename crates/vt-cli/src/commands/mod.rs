//! CLI subcommand implementations.

pub mod balances;
pub mod calendar;
pub mod count;
pub mod request;
pub mod set_balance;
pub mod suggest;
mod util;
