mod helpers;

use helpers::{CliTestHarness, TestFixtures};
use predicates::prelude::*;
use serde_json::Value;

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_help_lists_commands() {
    let harness = CliTestHarness::new();
    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("schedule"))
        .stdout(predicate::str::contains("calendar"))
        .stdout(predicate::str::contains("series"));
}

#[test]
fn test_schedule_weekly_series() {
    let harness = CliTestHarness::new();
    harness
        .run_success(&TestFixtures::weekly_series_args())
        .stdout(predicate::str::contains("Scheduled a weekly series"))
        .stdout(predicate::str::contains("4 match(es), 12 game(s)"))
        .stdout(predicate::str::contains("FREQ=WEEKLY"));

    let list = harness.run_json(&["list", "--json"]);
    let matches = list.as_array().unwrap();
    assert_eq!(matches.len(), 4);
    let dates: Vec<&str> = matches.iter().map(|m| m["match_date"].as_str().unwrap()).collect();
    assert_eq!(dates, vec!["2025-06-02", "2025-06-04", "2025-06-09", "2025-06-11"]);
    assert!(matches.iter().all(|m| m["series_id"].is_string()));
}

#[test]
fn test_list_filters_by_range_and_status() {
    let harness = CliTestHarness::new();
    harness.run_success(&TestFixtures::weekly_series_args());

    let list = harness.run_json(&["list", "--from", "2025-06-05", "--to", "2025-06-10", "--json"]);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let first = ids(&harness.run_json(&["list", "--json"]))[0].clone();
    harness.run_success(&["status", &first, "cancelled", "--reason", "server outage"]);

    let cancelled = harness.run_json(&["list", "--status", "cancelled", "--json"]);
    assert_eq!(cancelled.as_array().unwrap().len(), 1);
    assert_eq!(cancelled[0]["cancel_reason"], "server outage");
}

#[test]
fn test_record_games_then_complete() {
    let harness = CliTestHarness::new();
    harness.run_success(&TestFixtures::single_match_args());

    let match_id = ids(&harness.run_json(&["list", "--json"]))[0].clone();
    let detail = harness.run_json(&["show", &match_id, "--json"]);
    let games = detail["games"].as_array().unwrap();
    assert_eq!(games.len(), 2);

    let first_game = games[0]["id"].as_str().unwrap();
    let second_game = games[1]["id"].as_str().unwrap();
    harness
        .run_success(&["game", "record", first_game, "--result", "win", "--duration", "31:02"])
        .stdout(predicate::str::contains("Game 1 recorded"));
    harness.run_success(&["game", "record", second_game, "--result", "loss"]);

    harness
        .run_success(&["status", &match_id, "completed"])
        .stdout(predicate::str::contains("1W-1L-0D"));

    // Structural edits are refused once the match is completed.
    harness
        .run_failure(&["game", "add", &match_id])
        .stderr(predicate::str::contains("reopen it"));
}

#[test]
fn test_invalid_transition_is_reported() {
    let harness = CliTestHarness::new();
    harness.run_success(&TestFixtures::single_match_args());
    let match_id = ids(&harness.run_json(&["list", "--json"]))[0].clone();

    harness.run_success(&["status", &match_id, "cancelled"]);
    harness
        .run_failure(&["status", &match_id, "in-progress"])
        .stderr(predicate::str::contains("cannot become"));
}

#[test]
fn test_game_add_and_remove_renumbers() {
    let harness = CliTestHarness::new();
    harness.run_success(&TestFixtures::single_match_args());
    let match_id = ids(&harness.run_json(&["list", "--json"]))[0].clone();

    harness
        .run_success(&["game", "add", &match_id])
        .stdout(predicate::str::contains("Added game 3"));

    let detail = harness.run_json(&["show", &match_id, "--json"]);
    let first_game = detail["games"][0]["id"].as_str().unwrap().to_string();
    harness.run_success(&["game", "remove", &first_game]);

    let detail = harness.run_json(&["show", &match_id, "--json"]);
    let ordinals: Vec<i64> = detail["games"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["ordinal"].as_i64().unwrap())
        .collect();
    assert_eq!(ordinals, vec![1, 2]);
}

#[test]
fn test_game_fill_for_match_without_games() {
    let harness = CliTestHarness::new();
    harness.run_success(&["schedule", "G2", "--date", "2025-06-21"]);
    let match_id = ids(&harness.run_json(&["list", "--json"]))[0].clone();

    harness
        .run_success(&["game", "fill", &match_id, "--count", "3"])
        .stdout(predicate::str::contains("Created 3 game(s)"));

    // A second fill is refused rather than duplicating ordinals.
    harness.run_failure(&["game", "fill", &match_id, "--count", "3"]);
}

#[test]
fn test_player_cannot_schedule() {
    let harness = CliTestHarness::new();
    harness
        .command()
        .env("MATCHDAY_ACTOR__ROLE", "player")
        .args(TestFixtures::single_match_args())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only managers and admins"));

    let list = harness.run_json(&["list", "--json"]);
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn test_member_alias_is_unprivileged() {
    let harness = CliTestHarness::new();
    harness
        .command()
        .env("MATCHDAY_ACTOR__ROLE", "member")
        .args(TestFixtures::single_match_args())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only managers and admins"));

    let list = harness.run_json(&["list", "--json"]);
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn test_broken_config_refuses_to_run() {
    let harness = CliTestHarness::new();
    harness
        .command()
        .env("MATCHDAY_ACTOR__ROLE", "owner")
        .args(TestFixtures::single_match_args())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));

    let list = harness.run_json(&["list", "--json"]);
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn test_schedule_without_occurrences() {
    let harness = CliTestHarness::new();
    harness
        .run_success(&[
            "schedule", "Fnatic",
            "--date", "2025-06-02",
            "--on", "sat",
            "--until", "2025-06-04",
        ])
        .stdout(predicate::str::contains("nothing was scheduled"));

    harness
        .run_success(&["series", "list"])
        .stdout(predicate::str::contains("No series found."));
}

#[test]
fn test_on_requires_until() {
    let harness = CliTestHarness::new();
    harness.run_failure(&["schedule", "Fnatic", "--on", "mon"]);
}

#[test]
fn test_events_and_calendar() {
    let harness = CliTestHarness::new();
    harness.run_success(&TestFixtures::weekly_series_args());
    harness
        .run_success(&[
            "event", "add", "Scrim block",
            "--category", "practice",
            "--date", "2025-06-02",
            "--start", "18:00",
            "--end", "21:00",
            "--on", "tue,thu",
            "--until", "2025-06-08",
        ])
        .stdout(predicate::str::contains("Created 2 events"));

    harness
        .run_success(&["event", "list"])
        .stdout(predicate::str::contains("Scrim block"))
        .stdout(predicate::str::contains("18:00-21:00"));

    harness
        .run_success(&["calendar", "--from", "2025-06-02", "--days", "7"])
        .stdout(predicate::str::contains("vs Team Liquid"))
        .stdout(predicate::str::contains("Scrim block"))
        .stdout(predicate::str::contains("2025-06-05"));
}

#[test]
fn test_event_end_before_start() {
    let harness = CliTestHarness::new();
    harness
        .run_failure(&["event", "add", "Review", "--date", "2025-06-02", "--start", "20:00", "--end", "19:00"])
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_series_record_and_orphans() {
    let harness = CliTestHarness::new();
    harness.run_success(&TestFixtures::weekly_series_args());

    let list = harness.run_json(&["list", "--json"]);
    let series_id = list[0]["series_id"].as_str().unwrap().to_string();

    harness
        .run_success(&["series", "record", &series_id])
        .stdout(predicate::str::contains("Team Liquid"))
        .stdout(predicate::str::contains("0W-0L-0D"));

    harness
        .run_success(&["series", "orphans"])
        .stdout(predicate::str::contains("Every series still has matches."));

    for id in ids(&list) {
        harness.run_success(&["delete", &id, "--force"]);
    }

    harness
        .run_success(&["series", "orphans"])
        .stdout(predicate::str::contains("Team Liquid"));
}

#[test]
fn test_unknown_id() {
    let harness = CliTestHarness::new();
    harness
        .run_failure(&["show", "zz"])
        .stderr(predicate::str::contains("No match found"));
}
