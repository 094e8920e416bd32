//! # Matchday Core Library
//!
//! Scheduling and match-record engine behind the Matchday team dashboard.
//!
//! ## Features
//!
//! - **Weekly Series**: "repeat weekly on {days} until {date}" templates
//!   materialized into concrete match instances in a single transaction
//! - **Game Replication**: placeholder games created in bulk for every
//!   materialized match
//! - **Match Lifecycle**: status state machine that derives a `"{w}W-{l}L-{d}D"`
//!   outcome from a match's games whenever it is completed
//! - **Team Calendar**: matches and general events merged into one sorted,
//!   day-indexed view
//! - **Explicit Actors**: every mutating call receives the acting user and role
//!   and returns the identifiers whose cached state must be refreshed
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`actor`]: Acting user and privilege checks
//! - [`recurrence`]: Weekly recurrence expansion and occurrence planning
//! - [`lifecycle`]: Match status transitions and outcome aggregation
//! - [`calendar`]: Calendar merging and day lookup
//! - [`invalidation`]: Change signals returned by mutating operations
//! - [`repository`]: Data access layer with Repository pattern
//! - [`error`]: Error taxonomy shared by every operation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use matchday_core::{
//!     actor::{Actor, Role},
//!     db,
//!     models::{NewScheduleData, RepeatRule, ScheduleOutcome},
//!     recurrence::{MaterializationManager, WeekdaySet},
//!     repository::{SchedulingRepository, SqliteRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::establish_connection("matchday.db").await?;
//!     let repo = SqliteRepository::new(pool, MaterializationManager::with_defaults());
//!     let coach = Actor::new(uuid::Uuid::now_v7(), Role::Manager);
//!
//!     let data = NewScheduleData {
//!         opponent: "Team Liquid".to_string(),
//!         date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
//!         recurrence: Some(RepeatRule {
//!             weekdays: "mon,wed".parse::<WeekdaySet>()?,
//!             until: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
//!         }),
//!         game_count: Some(3),
//!         ..Default::default()
//!     };
//!
//!     if let ScheduleOutcome::Scheduled(report) = repo.schedule_matches(&coach, data).await? {
//!         println!("Scheduled {} matches", report.instances.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod calendar;
pub mod db;
pub mod error;
pub mod invalidation;
pub mod lifecycle;
pub mod models;
pub mod recurrence;
pub mod repository;
