use chrono::{Datelike, NaiveDate, Weekday};
use rrule::RRuleSet;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;
use crate::models::{MaterializationConfig, RepeatRule};

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A subset of the seven weekdays, stored as a bitmask with Monday in bit 0.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);
    pub const ALL: WeekdaySet = WeekdaySet(0b111_1111);

    pub fn single(day: Weekday) -> Self {
        Self(Self::bit(day))
    }

    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | Self::bit(day))
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    #[inline]
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Weekdays in the set, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_WEEKDAYS.iter().copied().filter(move |d| self.contains(*d))
    }

    #[inline]
    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(WeekdaySet::EMPTY, WeekdaySet::with)
    }
}

/// RFC 5545 BYDAY form, e.g. `MO,WE`.
impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.iter().map(byday_code).collect();
        write!(f, "{}", codes.join(","))
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid weekday list: {0}")]
pub struct ParseWeekdaySetError(String);

/// Accepts comma separated weekday names in any common spelling:
/// `mon,wed`, `MO,WE`, `monday, wednesday`. An empty string is the empty set.
impl FromStr for WeekdaySet {
    type Err = ParseWeekdaySetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = WeekdaySet::EMPTY;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day = match part.to_lowercase().as_str() {
                "mo" | "mon" | "monday" => Weekday::Mon,
                "tu" | "tue" | "tues" | "tuesday" => Weekday::Tue,
                "we" | "wed" | "wednesday" => Weekday::Wed,
                "th" | "thu" | "thur" | "thurs" | "thursday" => Weekday::Thu,
                "fr" | "fri" | "friday" => Weekday::Fri,
                "sa" | "sat" | "saturday" => Weekday::Sat,
                "su" | "sun" | "sunday" => Weekday::Sun,
                _ => return Err(ParseWeekdaySetError(part.to_string())),
            };
            set.insert(day);
        }
        Ok(set)
    }
}

fn byday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Every date in `[anchor, until]` whose weekday is in `weekdays`, ascending.
///
/// The anchor is included only when its own weekday is in the set. An empty
/// set, or a range containing none of the set's weekdays, yields an empty list.
pub fn expand(anchor: NaiveDate, weekdays: WeekdaySet, until: NaiveDate) -> Vec<NaiveDate> {
    occurrences(anchor, weekdays, until).collect()
}

/// Lazy form of [`expand`].
pub fn occurrences(
    anchor: NaiveDate,
    weekdays: WeekdaySet,
    until: NaiveDate,
) -> impl Iterator<Item = NaiveDate> {
    let last = if weekdays.is_empty() { None } else { Some(until) };

    anchor
        .iter_days()
        .take_while(move |date| last.is_some_and(|last| *date <= last))
        .filter(move |date| weekdays.contains(date.weekday()))
}

/// A weekly recurrence anchored at a start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyRecurrence {
    pub anchor: NaiveDate,
    pub weekdays: WeekdaySet,
    pub until: NaiveDate,
}

impl WeeklyRecurrence {
    pub fn new(anchor: NaiveDate, rule: RepeatRule) -> Self {
        Self {
            anchor,
            weekdays: rule.weekdays,
            until: rule.until,
        }
    }

    pub fn expand(&self) -> Vec<NaiveDate> {
        expand(self.anchor, self.weekdays, self.until)
    }

    pub fn occurrences(&self) -> impl Iterator<Item = NaiveDate> {
        occurrences(self.anchor, self.weekdays, self.until)
    }

    /// Canonical RRULE text, validated by the `rrule` parser.
    ///
    /// The series runs in a single implicit local calendar, so UNTIL is the
    /// last second of the end date written as a floating UTC stamp.
    pub fn to_rrule(&self) -> Result<String, CoreError> {
        if self.weekdays.is_empty() {
            return Err(CoreError::InvalidInput(
                "a weekly recurrence needs at least one weekday".to_string(),
            ));
        }

        let rule = format!(
            "FREQ=WEEKLY;BYDAY={};UNTIL={}",
            self.weekdays,
            self.until.format("%Y%m%dT235959Z")
        );
        let with_start = format!("DTSTART:{}\nRRULE:{}", self.anchor.format("%Y%m%dT000000Z"), rule);

        with_start
            .parse::<RRuleSet>()
            .map_err(|e| CoreError::InvalidInput(format!("Invalid recurrence '{}': {}", rule, e)))?;

        Ok(rule)
    }
}

/// MaterializationManager: turns schedule templates into concrete dates while
/// enforcing the configured size limits.
#[derive(Debug, Clone)]
pub struct MaterializationManager {
    config: MaterializationConfig,
}

impl MaterializationManager {
    pub fn new(config: MaterializationConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(MaterializationConfig::default())
    }

    /// Dates to materialize for a template anchored at `date`.
    ///
    /// Without a rule this is just `date`. With a rule the result may be empty,
    /// which callers report as "no occurrences" rather than an error.
    pub fn plan_occurrences(
        &self,
        date: NaiveDate,
        rule: Option<&RepeatRule>,
    ) -> Result<Vec<NaiveDate>, CoreError> {
        let Some(rule) = rule else {
            return Ok(vec![date]);
        };

        // One past the limit is enough to know the rule is too long.
        let limit = self.config.max_occurrences;
        let dates: Vec<NaiveDate> = WeeklyRecurrence::new(date, *rule)
            .occurrences()
            .take(limit.saturating_add(1))
            .collect();

        if dates.len() > limit {
            return Err(CoreError::InvalidInput(format!(
                "recurrence produces more than {} matches; choose an earlier end date",
                limit
            )));
        }

        tracing::debug!(
            anchor = %date,
            weekdays = %rule.weekdays,
            until = %rule.until,
            occurrences = dates.len(),
            "expanded weekly recurrence"
        );
        Ok(dates)
    }

    /// Rejects game counts above the configured per-match limit.
    pub fn check_game_count(&self, count: u32) -> Result<(), CoreError> {
        if count > self.config.max_games_per_match {
            return Err(CoreError::InvalidInput(format!(
                "{} games per match requested, the limit is {}",
                count, self.config.max_games_per_match
            )));
        }
        Ok(())
    }
}
