use clap::Parser;
use matchday_core::db;
use matchday_core::error::CoreError;
use matchday_core::recurrence::MaterializationManager;
use matchday_core::repository::SqliteRepository;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod sink;
mod util;
mod views;

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "matchday=info" } else { "matchday=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    // A broken config must not fall back to the privileged default actor.
    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let actor = config.actor();

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(db_pool, MaterializationManager::with_defaults());

    let result = match cli.command {
        cli::Commands::Schedule(command) => {
            commands::schedule::schedule(&repository, &actor, &config, command).await
        }
        cli::Commands::List(command) => commands::matches::list_matches(&repository, command).await,
        cli::Commands::Show(command) => commands::matches::show_match(&repository, command).await,
        cli::Commands::Status(command) => {
            commands::matches::set_status(&repository, &actor, command).await
        }
        cli::Commands::Delete(command) => {
            commands::matches::delete_match(&repository, &actor, command).await
        }
        cli::Commands::Game(command) => {
            commands::game::game_command(&repository, &actor, command).await
        }
        cli::Commands::Event(command) => {
            commands::event::event_command(&repository, &actor, command).await
        }
        cli::Commands::Calendar(command) => {
            commands::calendar::show_calendar(&repository, &config, command).await
        }
        cli::Commands::Series(command) => commands::series::series_command(&repository, command).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    let Some(core_error) = err.downcast_ref::<CoreError>() else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
        return;
    };

    match core_error {
        CoreError::Unauthorized { action } => {
            eprintln!(
                "{} Only managers and admins may {}.",
                "Error:".style(error_style),
                action
            );
        }
        CoreError::PartialFailure { stage, created, source } => {
            eprintln!(
                "{} The {} step failed: {}",
                "Error:".style(error_style),
                stage,
                source
            );
            if let Some(series_id) = created.series_id {
                eprintln!("  Series {} was created.", series_id.to_string().yellow());
            }
            eprintln!("  These matches were created and kept:");
            for id in &created.instance_ids {
                eprintln!("    {}", id.to_string().yellow());
            }
            eprintln!("  Retry with 'matchday game fill <match>... --count <n>'.");
        }
        CoreError::NotFound(s) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        CoreError::InvalidInput(s) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        CoreError::InvalidTransition { from, to } => {
            eprintln!(
                "{} A {} match cannot become {}",
                "Error:".style(error_style),
                from.yellow(),
                to.yellow()
            );
        }
        CoreError::InstanceLocked { status, .. } => {
            eprintln!(
                "{} This match is {}; reopen it before changing its games.",
                "Error:".style(error_style),
                status.yellow()
            );
        }
        CoreError::AmbiguousId(matches) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, label) in matches {
                eprintln!("  {} ({})", id.yellow(), label);
            }
        }
        _ => eprintln!("{} {}", "Error:".style(error_style), err),
    }
}
