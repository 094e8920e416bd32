use clap::{Args, Parser, Subcommand};
use matchday_core::models::{EventCategory, GameResult, MatchStatus};

/// Matchday: weekly match series, match records and the team calendar
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log persisted changes to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Schedule a match, or a weekly series of matches
    Schedule(ScheduleCommand),
    /// List matches
    List(ListCommand),
    /// Show a match and its games
    Show(ShowCommand),
    /// Move a match to another status
    Status(StatusCommand),
    /// Delete a match and its games
    Delete(DeleteCommand),
    /// Manage the games of a match
    #[command(subcommand)]
    Game(GameCommand),
    /// Manage general team events
    #[command(subcommand)]
    Event(EventCommand),
    /// Show matches and events day by day
    Calendar(CalendarCommand),
    /// Inspect weekly match series
    #[command(subcommand)]
    Series(SeriesCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ScheduleCommand {
    /// The opponent (display label for every generated match)
    pub opponent: String,
    /// Match date, or the first date of a series (e.g. '2025-06-02', 'next monday')
    #[arg(short, long, default_value = "today")]
    pub date: String,
    /// Time of day (e.g. '19:30', '7:30pm')
    #[arg(long)]
    pub at: Option<String>,
    /// Repeat weekly on these days (e.g. 'mon,wed')
    #[arg(long, requires = "until")]
    pub on: Option<String>,
    /// Last date of the series, inclusive
    #[arg(long, requires = "on")]
    pub until: Option<String>,
    /// Placeholder games to create per match
    #[arg(short, long)]
    pub games: Option<u32>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Game patch / version tag
    #[arg(long)]
    pub patch: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First date to include
    #[arg(long)]
    pub from: Option<String>,
    /// Last date to include
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    #[command(flatten)]
    pub range: RangeArgs,
    /// Only matches in this status
    #[arg(long)]
    pub status: Option<MatchStatus>,
    /// Only matches of this series (ID or prefix)
    #[arg(long)]
    pub series: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// The ID (or prefix) of the match
    pub id: String,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusCommand {
    /// The ID (or prefix) of the match
    pub id: String,
    /// scheduled, in-progress, completed or cancelled
    pub status: MatchStatus,
    /// Why the match was cancelled
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or prefix) of the match
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum GameCommand {
    /// Append a game to a match
    Add {
        /// The ID (or prefix) of the match
        match_id: String,
    },
    /// Create placeholder games for matches that have none yet
    Fill {
        /// IDs (or prefixes) of the matches
        #[arg(required = true)]
        match_ids: Vec<String>,
        /// Games per match
        #[arg(short, long)]
        count: u32,
    },
    /// Remove a game and renumber the rest
    Remove {
        /// The ID (or prefix) of the game
        game_id: String,
    },
    /// Record a game's result, duration or notes
    Record(RecordGameCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct RecordGameCommand {
    /// The ID (or prefix) of the game
    pub game_id: String,
    /// win, loss, draw or n/a
    #[arg(short, long)]
    pub result: Option<GameResult>,
    #[arg(long)]
    pub duration: Option<String>,
    #[arg(long, conflicts_with = "duration")]
    pub duration_clear: bool,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, conflicts_with = "notes")]
    pub notes_clear: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum EventCommand {
    /// Add an event, or one event per weekly occurrence
    Add(AddEventCommand),
    /// List events
    List {
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Delete a single event
    Delete {
        /// The ID (or prefix) of the event
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct AddEventCommand {
    pub title: String,
    /// practice, meeting, tournament, review, social or other
    #[arg(short, long, default_value = "other")]
    pub category: EventCategory,
    #[arg(short, long, default_value = "today")]
    pub date: String,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Repeat weekly on these days (e.g. 'tue,thu')
    #[arg(long, requires = "until")]
    pub on: Option<String>,
    /// Last date of the repetition, inclusive
    #[arg(long, requires = "on")]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CalendarCommand {
    /// First day to show
    #[arg(long, default_value = "today")]
    pub from: String,
    /// Number of days to show (defaults to the configured window)
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SeriesCommand {
    /// List all series
    List,
    /// Status counts and game record of one series
    Record {
        /// The ID (or prefix) of the series
        id: String,
    },
    /// Series that no longer have any matches
    Orphans,
}
