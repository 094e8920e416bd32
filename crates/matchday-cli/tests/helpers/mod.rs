use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Runs the `matchday` binary against a throwaway database. The working
/// directory is the temp dir too, so no stray `matchday.toml` is picked up.
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("matchday").expect("Failed to find matchday binary");
        cmd.current_dir(self.temp_dir.path())
            .env("MATCHDAY_DATABASE_PATH", self.temp_dir.path().join("test.db"))
            .env_remove("MATCHDAY_ACTOR__ROLE")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a command that prints JSON and parses its stdout.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run_success(args).get_output().stdout.clone();
        serde_json::from_slice(&output).expect("command did not print valid JSON")
    }
}

/// Standard fixtures. 2025-06-02 is a Monday.
pub struct TestFixtures;

impl TestFixtures {
    /// Mondays and Wednesdays from 2025-06-02 through 2025-06-15: four matches.
    pub fn weekly_series_args() -> Vec<&'static str> {
        vec![
            "schedule", "Team Liquid",
            "--date", "2025-06-02",
            "--at", "19:30",
            "--on", "mon,wed",
            "--until", "2025-06-15",
            "--games", "3",
        ]
    }

    pub fn single_match_args() -> Vec<&'static str> {
        vec!["schedule", "Vitality", "--date", "2025-06-20", "--games", "2"]
    }
}
