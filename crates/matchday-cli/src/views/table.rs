use chrono::{Local, NaiveDate, NaiveTime};
use chrono_humanize::HumanTime;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use matchday_core::calendar::{Calendar, EntrySource};
use matchday_core::models::{
    GameResult, GeneralEvent, MatchGame, MatchInstance, MatchSeries, MatchStatus, SeriesRecord,
};

use crate::util::short_id;

fn relative_day(date: NaiveDate) -> String {
    let today = Local::now().date_naive();
    match (date - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        _ => HumanTime::from(date - today).to_string(),
    }
}

fn time_text(time: Option<NaiveTime>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.format("%H:%M").to_string())
}

fn status_cell(status: MatchStatus) -> Cell {
    let cell = Cell::new(status.to_string());
    match status {
        MatchStatus::Scheduled => cell,
        MatchStatus::InProgress => cell.fg(Color::Yellow).add_attribute(Attribute::Bold),
        MatchStatus::Completed => cell.fg(Color::Green),
        MatchStatus::Cancelled => cell.fg(Color::DarkGrey).add_attribute(Attribute::CrossedOut),
    }
}

fn result_cell(result: GameResult) -> Cell {
    let cell = Cell::new(result.to_string());
    match result {
        GameResult::Win => cell.fg(Color::Green),
        GameResult::Loss => cell.fg(Color::Red),
        GameResult::Draw => cell.fg(Color::Yellow),
        GameResult::NotApplicable => cell.fg(Color::DarkGrey),
    }
}

pub fn display_matches(matches: &[MatchInstance]) {
    if matches.is_empty() {
        println!("No matches found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Opponent", "Date", "Time", "Status", "Outcome", "Patch"]);

    for instance in matches {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&instance.id)));

        let mut opponent = String::new();
        if instance.series_id.is_some() {
            opponent.push('↻');
            opponent.push(' ');
        }
        opponent.push_str(&instance.opponent);
        row.add_cell(Cell::new(opponent));

        row.add_cell(Cell::new(format!(
            "{} ({})",
            instance.match_date,
            relative_day(instance.match_date)
        )));
        row.add_cell(Cell::new(time_text(instance.match_time)));
        row.add_cell(status_cell(instance.status));
        row.add_cell(Cell::new(instance.outcome.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(instance.patch.as_deref().unwrap_or("-")));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_match_detail(instance: &MatchInstance, games: &[MatchGame]) {
    println!("Match {} vs {}", instance.id, instance.opponent);
    println!("  Date:    {} {}", instance.match_date, time_text(instance.match_time));
    println!("  Status:  {}", instance.status);
    if let Some(outcome) = &instance.outcome {
        println!("  Outcome: {}", outcome);
    }
    if let Some(reason) = &instance.cancel_reason {
        println!("  Reason:  {}", reason);
    }
    if let Some(series_id) = instance.series_id {
        println!("  Series:  {}", short_id(&series_id));
    }
    if let Some(patch) = &instance.patch {
        println!("  Patch:   {}", patch);
    }
    if let Some(notes) = &instance.notes {
        println!("  Notes:   {}", notes);
    }
    println!();
    display_games(games);
}

pub fn display_games(games: &[MatchGame]) {
    if games.is_empty() {
        println!("No games recorded.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "#", "Result", "Duration", "Notes"]);

    for game in games {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&game.id)));
        row.add_cell(Cell::new(game.ordinal));
        row.add_cell(result_cell(game.result));
        row.add_cell(Cell::new(game.duration.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(game.notes.as_deref().unwrap_or("")));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_events(events: &[GeneralEvent]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Category", "Date", "Time"]);

    for event in events {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&event.id)));
        row.add_cell(Cell::new(&event.title));
        row.add_cell(Cell::new(event.category));
        row.add_cell(Cell::new(format!("{} ({})", event.event_date, relative_day(event.event_date))));
        let time = match (event.start_time, event.end_time) {
            (Some(start), Some(end)) => format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
            (start, _) => time_text(start),
        };
        row.add_cell(Cell::new(time));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_calendar(calendar: &Calendar) {
    if calendar.is_empty() {
        println!("Nothing on the calendar.");
        return;
    }

    for (day, entries) in calendar.days() {
        println!("{} {} ({})", day.format("%a"), day, relative_day(day));

        let mut table = Table::new();
        for entry in entries {
            let mut row = Row::new();
            row.add_cell(Cell::new(time_text(entry.time)));
            row.add_cell(Cell::new(&entry.title));
            match &entry.source {
                EntrySource::Match { instance_id, status } => {
                    row.add_cell(status_cell(*status));
                    row.add_cell(Cell::new(short_id(instance_id)));
                }
                EntrySource::Event { event_id, category } => {
                    row.add_cell(Cell::new(category).fg(Color::Cyan));
                    row.add_cell(Cell::new(short_id(event_id)));
                }
            }
            table.add_row(row);
        }
        println!("{table}");
    }
}

pub fn display_series(series: &[MatchSeries]) {
    if series.is_empty() {
        println!("No series found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Opponent", "Days", "From", "Until", "Time"]);

    for s in series {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&s.id)));
        row.add_cell(Cell::new(&s.opponent));
        row.add_cell(Cell::new(s.weekdays));
        row.add_cell(Cell::new(s.start_date));
        row.add_cell(Cell::new(s.end_date));
        row.add_cell(Cell::new(time_text(s.start_time)));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_series_record(series: &MatchSeries, record: &SeriesRecord) {
    println!("Series {} vs {} ({})", short_id(&series.id), series.opponent, series.rrule);

    let mut table = Table::new();
    table.set_header(vec!["Matches", "Scheduled", "In progress", "Completed", "Cancelled", "Record", "Win rate"]);
    table.add_row(vec![
        Cell::new(record.total_matches),
        Cell::new(record.scheduled),
        Cell::new(record.in_progress),
        Cell::new(record.completed),
        Cell::new(record.cancelled),
        Cell::new(format!("{}W-{}L-{}D", record.wins, record.losses, record.draws)),
        Cell::new(
            record
                .win_rate()
                .map_or_else(|| "-".to_string(), |rate| format!("{:.0}%", rate * 100.0)),
        ),
    ]);

    println!("{table}");
}
