use anyhow::Result;
use matchday_core::actor::Actor;
use matchday_core::models::GameUpdate;
use matchday_core::repository::Repository;
use owo_colors::OwoColorize;

use crate::cli::{GameCommand, RecordGameCommand};
use crate::sink;
use crate::util::{resolve_game_id, resolve_match_id, short_id};

pub async fn game_command(repo: &impl Repository, actor: &Actor, command: GameCommand) -> Result<()> {
    match command {
        GameCommand::Add { match_id } => {
            let instance_id = resolve_match_id(repo, &match_id).await?;
            let changed = repo.add_game(actor, instance_id).await?;
            sink::publish(&changed.invalidations);
            println!(
                "{} Added game {} ({})",
                "✓".green().bold(),
                changed.value.ordinal,
                short_id(&changed.value.id).yellow()
            );
        }
        GameCommand::Fill { match_ids, count } => {
            let mut ids = Vec::with_capacity(match_ids.len());
            for prefix in &match_ids {
                ids.push(resolve_match_id(repo, prefix).await?);
            }
            let changed = repo.replicate_games(actor, &ids, Some(count)).await?;
            sink::publish(&changed.invalidations);
            println!(
                "{} Created {} game(s) across {} match(es)",
                "✓".green().bold(),
                changed.value.len(),
                ids.len()
            );
        }
        GameCommand::Remove { game_id } => {
            let id = resolve_game_id(repo, &game_id).await?;
            let changed = repo.remove_game(actor, id).await?;
            sink::publish(&changed.invalidations);
            println!("{} Removed game {}", "✓".green().bold(), short_id(&id).yellow());
        }
        GameCommand::Record(command) => record(repo, actor, command).await?,
    }
    Ok(())
}

fn build_update(command: &RecordGameCommand) -> GameUpdate {
    let duration = if command.duration_clear {
        Some(None)
    } else {
        command.duration.clone().map(Some)
    };
    let notes = if command.notes_clear {
        Some(None)
    } else {
        command.notes.clone().map(Some)
    };

    GameUpdate {
        result: command.result,
        duration,
        notes,
    }
}

async fn record(repo: &impl Repository, actor: &Actor, command: RecordGameCommand) -> Result<()> {
    let id = resolve_game_id(repo, &command.game_id).await?;
    let changed = repo.record_game(actor, id, build_update(&command)).await?;
    sink::publish(&changed.invalidations);

    let game = changed.value;
    println!(
        "{} Game {} recorded: {}",
        "✓".green().bold(),
        game.ordinal,
        game.result.to_string().cyan()
    );
    Ok(())
}
