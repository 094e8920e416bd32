use anyhow::{anyhow, Result};
use matchday_core::error::CoreError;
use matchday_core::repository::Repository;

use crate::cli::SeriesCommand;
use crate::util::resolve_series_id;
use crate::views::table;

pub async fn series_command(repo: &impl Repository, command: SeriesCommand) -> Result<()> {
    match command {
        SeriesCommand::List => {
            let series = repo.list_series().await?;
            table::display_series(&series);
        }
        SeriesCommand::Record { id } => {
            let id = resolve_series_id(repo, &id).await?;
            let series = repo
                .find_series_by_id(id)
                .await?
                .ok_or_else(|| anyhow!(CoreError::NotFound(format!("Series with id {} not found", id))))?;
            let record = repo.series_record(id).await?;
            table::display_series_record(&series, &record);
        }
        SeriesCommand::Orphans => {
            let orphans = repo.find_orphan_series().await?;
            if orphans.is_empty() {
                println!("Every series still has matches.");
            } else {
                table::display_series(&orphans);
            }
        }
    }
    Ok(())
}
