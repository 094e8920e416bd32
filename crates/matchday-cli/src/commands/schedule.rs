use anyhow::Result;
use matchday_core::actor::Actor;
use matchday_core::models::{NewScheduleData, ScheduleOutcome};
use matchday_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::ScheduleCommand;
use crate::config::Config;
use crate::parser::{parse_date, parse_optional_time, parse_repeat_rule};
use crate::sink;
use crate::util::short_id;

pub async fn schedule(
    repo: &impl Repository,
    actor: &Actor,
    config: &Config,
    command: ScheduleCommand,
) -> Result<()> {
    let data = NewScheduleData {
        opponent: command.opponent,
        date: parse_date(&command.date)?,
        time: parse_optional_time(command.at.as_deref())?,
        recurrence: parse_repeat_rule(command.on.as_deref(), command.until.as_deref())?,
        game_count: command.games.or(Some(config.default_games)),
        notes: command.notes,
        patch: command.patch,
    };

    let report = match repo.schedule_matches(actor, data).await? {
        ScheduleOutcome::Scheduled(report) => report,
        ScheduleOutcome::NoOccurrences => {
            println!(
                "{} No dates fall on the chosen weekdays in that range; nothing was scheduled.",
                "!".yellow().bold()
            );
            return Ok(());
        }
    };
    sink::publish(&report.invalidations);

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    match &report.series {
        Some(series) => {
            println!(
                "{} Scheduled a weekly series vs {}",
                "✓".style(success_style),
                series.opponent.bright_white().bold()
            );
            println!(
                "  {} Series ID: {} ({})",
                "→".style(info_style),
                short_id(&series.id).yellow(),
                series.rrule.bright_black()
            );
        }
        None => {
            if let Some(instance) = report.instances.first() {
                println!(
                    "{} Scheduled match vs {} on {}",
                    "✓".style(success_style),
                    instance.opponent.bright_white().bold(),
                    instance.match_date
                );
            }
        }
    }

    println!(
        "  {} {} match(es), {} game(s)",
        "→".style(info_style),
        report.instances.len(),
        report.games.len()
    );
    for instance in &report.instances {
        println!("    {} {}", short_id(&instance.id).yellow(), instance.match_date);
    }

    Ok(())
}
