use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use matchday_core::actor::Actor;
use matchday_core::error::CoreError;
use matchday_core::models::{EventOutcome, NewEventData};
use matchday_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::{AddEventCommand, EventCommand};
use crate::parser::{parse_date, parse_optional_time, parse_range, parse_repeat_rule};
use crate::sink;
use crate::util::{resolve_event_id, short_id};
use crate::views::table;

pub async fn event_command(repo: &impl Repository, actor: &Actor, command: EventCommand) -> Result<()> {
    match command {
        EventCommand::Add(command) => add_event(repo, actor, command).await,
        EventCommand::List { range } => {
            let range = parse_range(range.from.as_deref(), range.to.as_deref())?;
            let events = repo.list_events(range).await?;
            table::display_events(&events);
            Ok(())
        }
        EventCommand::Delete { id, force } => {
            let id = resolve_event_id(repo, &id).await?;
            let event = repo
                .find_event_by_id(id)
                .await?
                .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Event with id {} not found", id))))?;

            if !force {
                let confirmation = Confirm::new()
                    .with_prompt(format!("Delete event '{}' on {}?", event.title, event.event_date))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmation {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }

            let changed = repo.delete_event(actor, id).await?;
            sink::publish(&changed.invalidations);
            println!("{} Deleted event '{}'", "✓".green().bold(), event.title);
            Ok(())
        }
    }
}

async fn add_event(repo: &impl Repository, actor: &Actor, command: AddEventCommand) -> Result<()> {
    let data = NewEventData {
        title: command.title,
        category: command.category,
        date: parse_date(&command.date)?,
        start_time: parse_optional_time(command.start.as_deref())?,
        end_time: parse_optional_time(command.end.as_deref())?,
        description: command.description,
        recurrence: parse_repeat_rule(command.on.as_deref(), command.until.as_deref())?,
    };

    match repo.create_event(actor, data).await? {
        EventOutcome::Created(changed) => {
            sink::publish(&changed.invalidations);
            if let [event] = changed.value.as_slice() {
                println!(
                    "{} Created event '{}' on {} ({})",
                    "✓".green().bold(),
                    event.title.bright_white().bold(),
                    event.event_date,
                    short_id(&event.id).yellow()
                );
            } else {
                println!("{} Created {} events", "✓".green().bold(), changed.value.len());
            }
        }
        EventOutcome::NoOccurrences => {
            println!(
                "{} No dates fall on the chosen weekdays in that range; no events were created.",
                "!".yellow().bold()
            );
        }
    }
    Ok(())
}
