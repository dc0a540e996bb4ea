use chrono::{Duration, Utc};
use clap::{Args, ValueEnum};
use focusguard_core::analytics::{summarize, totals_by_category, totals_by_url};
use focusguard_core::Database;

use super::{print_json, CommandResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum GroupBy {
    Url,
    Category,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Only totals for one grouping
    #[arg(long, value_enum)]
    pub by: Option<GroupBy>,
    /// Only visits from the last N days
    #[arg(long)]
    pub days: Option<u32>,
}

pub fn run(args: StatsArgs) -> CommandResult {
    let db = Database::open()?;
    let since = args
        .days
        .map(|days| Utc::now() - Duration::days(i64::from(days)));
    let visits = db.visits(since)?;

    match args.by {
        Some(GroupBy::Url) => print_json(&totals_by_url(&visits))?,
        Some(GroupBy::Category) => print_json(&totals_by_category(&visits))?,
        None => print_json(&summarize(&visits))?,
    }
    Ok(())
}
