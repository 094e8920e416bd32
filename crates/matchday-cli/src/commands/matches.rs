use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use matchday_core::actor::Actor;
use matchday_core::error::CoreError;
use matchday_core::models::MatchInstance;
use matchday_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::{DeleteCommand, ListCommand, ShowCommand, StatusCommand};
use crate::parser::parse_range;
use crate::sink;
use crate::util::{resolve_match_id, resolve_series_id};
use crate::views::table;

pub async fn list_matches(repo: &impl Repository, command: ListCommand) -> Result<()> {
    let range = parse_range(command.range.from.as_deref(), command.range.to.as_deref())?;
    let series_id = match &command.series {
        Some(prefix) => Some(resolve_series_id(repo, prefix).await?),
        None => None,
    };

    let matches: Vec<MatchInstance> = repo
        .list_instances(range)
        .await?
        .into_iter()
        .filter(|m| command.status.map_or(true, |status| m.status == status))
        .filter(|m| series_id.map_or(true, |id| m.series_id == Some(id)))
        .collect();

    if command.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        table::display_matches(&matches);
    }
    Ok(())
}

async fn load_match(repo: &impl Repository, prefix: &str) -> Result<MatchInstance> {
    let id = resolve_match_id(repo, prefix).await?;
    repo.find_instance_by_id(id)
        .await?
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Match with id {} not found", id))))
}

pub async fn show_match(repo: &impl Repository, command: ShowCommand) -> Result<()> {
    let instance = load_match(repo, &command.id).await?;
    let games = repo.games_for_instance(instance.id).await?;
    if command.json {
        let detail = serde_json::json!({ "match": instance, "games": games });
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        table::display_match_detail(&instance, &games);
    }
    Ok(())
}

pub async fn set_status(repo: &impl Repository, actor: &Actor, command: StatusCommand) -> Result<()> {
    let id = resolve_match_id(repo, &command.id).await?;
    let changed = repo
        .transition_instance(actor, id, command.status, command.reason)
        .await?;
    sink::publish(&changed.invalidations);

    let instance = changed.value;
    print!(
        "{} Match vs {} is now {}",
        "✓".green().bold(),
        instance.opponent.bright_white().bold(),
        instance.status.to_string().cyan()
    );
    match &instance.outcome {
        Some(outcome) => println!(" ({})", outcome),
        None => println!(),
    }
    Ok(())
}

pub async fn delete_match(repo: &impl Repository, actor: &Actor, command: DeleteCommand) -> Result<()> {
    let instance = load_match(repo, &command.id).await?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Delete the match vs '{}' on {} and all of its games?",
                instance.opponent, instance.match_date
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let changed = repo.delete_instance(actor, instance.id).await?;
    sink::publish(&changed.invalidations);
    println!("{} Deleted match vs {}", "✓".green().bold(), instance.opponent);
    Ok(())
}
