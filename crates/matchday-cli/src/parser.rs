use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use chrono_english::{parse_date_string, Dialect};
use matchday_core::models::{DateRange, RepeatRule};
use matchday_core::recurrence::WeekdaySet;

/// Parses an ISO date or a free-form phrase such as 'today' or 'next friday'.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_date_string(input, Local::now(), Dialect::Uk)
        .map(|dt| dt.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

/// Parses '19:30', '19:30:00', '7:30pm' or '7pm'.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let mut normalized: String = input.split_whitespace().collect::<String>().to_lowercase();

    if (normalized.ends_with("am") || normalized.ends_with("pm")) && !normalized.contains(':') {
        normalized.insert_str(normalized.len() - 2, ":00");
    }

    ["%H:%M", "%H:%M:%S", "%I:%M%p"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| anyhow!("Failed to parse time '{}'. Use e.g. '19:30' or '7:30pm'", input))
}

pub fn parse_optional_time(input: Option<&str>) -> Result<Option<NaiveTime>> {
    input.map(parse_time).transpose()
}

/// Builds the weekly rule from `--on` / `--until`; clap guarantees they come together.
pub fn parse_repeat_rule(on: Option<&str>, until: Option<&str>) -> Result<Option<RepeatRule>> {
    match (on, until) {
        (Some(on), Some(until)) => {
            let weekdays: WeekdaySet = on.parse()?;
            if weekdays.is_empty() {
                return Err(anyhow!("--on needs at least one weekday"));
            }
            Ok(Some(RepeatRule {
                weekdays,
                until: parse_date(until)?,
            }))
        }
        (None, None) => Ok(None),
        _ => Err(anyhow!("--on and --until must be given together")),
    }
}

pub fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<DateRange> {
    Ok(DateRange {
        start: from.map(parse_date).transpose()?,
        end: to.map(parse_date).transpose()?,
    })
}
