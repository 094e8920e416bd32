use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use matchday_core::actor::{Actor, Role};
use serde::Deserialize;
use uuid::Uuid;

/// CLI settings, read from `matchday.toml` and `MATCHDAY_*` environment
/// variables. Nested keys use a double underscore: `MATCHDAY_ACTOR__ROLE`.
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    /// Games per match when `--games` is omitted
    pub default_games: u32,
    /// Days shown by `calendar` when `--days` is omitted
    pub calendar_days: u32,
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "matchday.db".to_string(),
            default_games: 0,
            calendar_days: 14,
            actor: ActorConfig::default(),
        }
    }
}

/// Who is running the CLI. Role resolution lives outside the core, so the
/// CLI simply trusts its configuration.
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct ActorConfig {
    pub user_id: Uuid,
    pub role: Role,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            user_id: Uuid::nil(),
            role: Role::Manager,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("matchday.toml"))
            .merge(Env::prefixed("MATCHDAY_").split("__"))
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.actor.user_id, self.actor.role)
    }
}
