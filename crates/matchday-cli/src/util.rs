use anyhow::{anyhow, Result};
use matchday_core::error::CoreError;
use matchday_core::repository::Repository;
use uuid::Uuid;

/// Picks the single record matching a short ID, or explains why there is none.
fn pick_one<T>(short_id: &str, kind: &str, found: Vec<T>, describe: impl Fn(T) -> (Uuid, String)) -> Result<Uuid> {
    let mut found: Vec<(Uuid, String)> = found.into_iter().map(describe).collect();
    match found.len() {
        1 => Ok(found.remove(0).0),
        0 => Err(anyhow!(CoreError::NotFound(format!(
            "No {} found with ID prefix '{}'",
            kind, short_id
        )))),
        _ => Err(anyhow!(CoreError::AmbiguousId(
            found.into_iter().map(|(id, label)| (id.to_string(), label)).collect()
        ))),
    }
}

fn check_length(short_id: &str) -> Result<()> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    Ok(())
}

pub async fn resolve_match_id(repo: &impl Repository, short_id: &str) -> Result<Uuid> {
    check_length(short_id)?;
    let found = repo.find_instances_by_short_id_prefix(short_id).await?;
    pick_one(short_id, "match", found, |m| {
        (m.id, format!("vs {} on {}", m.opponent, m.match_date))
    })
}

pub async fn resolve_game_id(repo: &impl Repository, short_id: &str) -> Result<Uuid> {
    check_length(short_id)?;
    let found = repo.find_games_by_short_id_prefix(short_id).await?;
    pick_one(short_id, "game", found, |g| (g.id, format!("game {}", g.ordinal)))
}

pub async fn resolve_event_id(repo: &impl Repository, short_id: &str) -> Result<Uuid> {
    check_length(short_id)?;
    let found = repo.find_events_by_short_id_prefix(short_id).await?;
    pick_one(short_id, "event", found, |e| {
        (e.id, format!("{} on {}", e.title, e.event_date))
    })
}

pub async fn resolve_series_id(repo: &impl Repository, short_id: &str) -> Result<Uuid> {
    check_length(short_id)?;
    let found = repo.find_series_by_short_id_prefix(short_id).await?;
    pick_one(short_id, "series", found, |s| {
        (s.id, format!("vs {} ({})", s.opponent, s.weekdays))
    })
}

/// First seven hex digits, the form shown in tables.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..7].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_one() {
        let id = Uuid::now_v7();
        assert_eq!(pick_one("ab", "match", vec![id], |i| (i, String::new())).unwrap(), id);

        let err = pick_one("ab", "match", Vec::<Uuid>::new(), |i| (i, String::new())).unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::NotFound(_))));

        let err = pick_one("ab", "match", vec![id, Uuid::now_v7()], |i| (i, String::new())).unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::AmbiguousId(ids)) if ids.len() == 2));
    }

    #[test]
    fn test_short_id_is_hex_prefix() {
        let id = Uuid::now_v7();
        assert_eq!(short_id(&id), id.simple().to_string()[..7]);
    }
}
