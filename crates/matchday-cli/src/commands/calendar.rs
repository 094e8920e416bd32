use anyhow::Result;
use chrono::Days;
use matchday_core::models::DateRange;
use matchday_core::repository::Repository;

use crate::cli::CalendarCommand;
use crate::config::Config;
use crate::parser::parse_date;
use crate::views::table;

pub async fn show_calendar(repo: &impl Repository, config: &Config, command: CalendarCommand) -> Result<()> {
    let from = parse_date(&command.from)?;
    let days = command.days.unwrap_or(config.calendar_days).max(1);
    let to = from
        .checked_add_days(Days::new(u64::from(days - 1)))
        .unwrap_or(from);

    let calendar = repo.calendar_between(DateRange::between(from, to)).await?;
    table::display_calendar(&calendar);
    Ok(())
}
