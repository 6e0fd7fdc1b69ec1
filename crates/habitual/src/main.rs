//! habitual - command-line habit tracker
//!
//! This is the main entry point. It wires together:
//! - Configuration loading
//! - Logging
//! - Store initialization
//! - The habit collection of the selected owner

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use habitual_config::{LogFileMode, LoggingConfig, Settings, load_config_if_present};
use habitual_core::{
    BreakRanking, CheckOutcome, DEMO_ALT_OWNER, DEMO_OWNER, Habit, HabitCollection,
};
use habitual_store::{HabitStore, MemoryStore, SqliteStore};
use habitual_util::{
    Clock, HABITUAL_CONFIG_ENV, HABITUAL_DATA_DIR_ENV, HabitId, OwnerId, Periodicity, SystemClock,
    default_config_path,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// habitual - Track daily and weekly habits
#[derive(Parser, Debug)]
#[command(name = "habitual")]
#[command(about = "Track daily and weekly habits, their streaks and their breaks", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/habitual/habitual.toml)
    #[arg(short, long, env = HABITUAL_CONFIG_ENV, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set HABITUAL_DATA_DIR env var)
    #[arg(short, long, env = HABITUAL_DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Whose habits to work with (or set HABITUAL_OWNER env var)
    #[arg(short, long, env = "HABITUAL_OWNER")]
    owner: Option<String>,

    /// Log level, overrides the configured one
    #[arg(short, long)]
    log_level: Option<String>,

    /// Keep habits in memory only; nothing is read from or written to disk
    #[arg(long)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a habit
    Add {
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Stored code or name ("daily", "weekly")
        #[arg(short, long, default_value = "daily")]
        periodicity: String,
    },

    /// Change the title and/or description of a habit
    Edit {
        id: HabitId,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a habit
    Delete { id: HabitId },

    /// Delete every habit of the owner
    Purge {
        /// Required, there is no undo from the command line
        #[arg(long)]
        yes: bool,
    },

    /// Check a habit off for the current day or week
    Check { id: HabitId },

    /// List habits
    List {
        /// Only habits with this periodicity (stored code or name)
        #[arg(short, long)]
        periodicity: Option<String>,

        #[arg(short, long, value_enum)]
        sort: Option<SortOrder>,
    },

    /// List habits not yet done for the current period
    Unchecked,

    /// Rank habits by missed periods
    Breaks {
        /// Only count last calendar month
        #[arg(long)]
        last_month: bool,
    },

    /// Show a single habit
    Show {
        id: HabitId,

        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the stored code of each periodicity
    Periodicities,

    /// Add a set of demo habits for the owners "demo" and "demo-alt"
    Seed,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortOrder {
    Streak,
    LongestStreak,
    Created,
}

fn init_logging(args: &Args, logging: &LoggingConfig) -> Result<()> {
    let directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| logging.level.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }

            let mut options = OpenOptions::new();
            options.create(true);
            match logging.mode {
                LogFileMode::Append => options.append(true),
                LogFileMode::Truncate => options.write(true).truncate(true),
            };
            let file = options
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            // stdout is reserved for command output
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn open_store(args: &Args, settings: &Settings) -> Result<Arc<dyn HabitStore>> {
    if args.ephemeral {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let data_dir = &settings.storage.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = settings.storage.database_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    info!(db_path = %db_path.display(), "Store initialized");
    Ok(Arc::new(store))
}

fn print_habits(habits: &[&Habit]) {
    if habits.is_empty() {
        println!("No habits.");
        return;
    }

    println!(
        "{:>4}  {:<7}  {:>6}  {:>7}  {}",
        "ID", "EVERY", "STREAK", "LONGEST", "TITLE"
    );
    for habit in habits {
        let every = match habit.periodicity() {
            Periodicity::Daily => "day",
            Periodicity::Weekly => "week",
        };
        println!(
            "{:>4}  {:<7}  {:>6}  {:>7}  {}",
            habit.id().to_string(),
            every,
            habit.streak(),
            habit.longest_streak(),
            habit.title()
        );
    }
}

fn print_ranking(ranking: &BreakRanking<'_>) {
    if ranking.is_empty() {
        println!("No habits.");
        return;
    }

    println!("{:>4}  {:>6}  {}", "ID", "BREAKS", "TITLE");
    for (habit, breaks) in ranking.iter() {
        println!("{:>4}  {:>6}  {}", habit.id().to_string(), breaks, habit.title());
    }
}

fn print_habit(habit: &Habit, now: chrono::NaiveDateTime) {
    let or_never = |value: Option<String>| value.unwrap_or_else(|| "never".to_string());

    println!("#{} {} ({})", habit.id(), habit.title(), habit.periodicity());
    if !habit.description().is_empty() {
        println!("  {}", habit.description());
    }
    println!("  created:      {}", habit.created_at());
    println!(
        "  last checked: {}",
        or_never(habit.last_checked().map(ToString::to_string))
    );
    println!(
        "  last break:   {}",
        or_never(habit.last_break().map(ToString::to_string))
    );
    println!(
        "  streak:       {} (longest {})",
        habit.streak(),
        habit.longest_streak()
    );
    println!(
        "  breaks:       {} total, {} last month",
        habit.total_breaks(),
        habit.last_month_breaks(now)
    );
    for (year, month, count) in habit.break_history().months() {
        println!("    {}-{:02}: {}", year, month, count);
    }
}

fn run(args: &Args, settings: Settings) -> Result<()> {
    let store = open_store(args, &settings)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut habits = HabitCollection::new(store, clock.clone(), settings.tracking);

    if let Some(owner) = &args.owner {
        habits
            .select_owner(OwnerId::new(owner.as_str()))
            .with_context(|| format!("Failed to load habits of {}", owner))?;
    }

    match &args.command {
        Command::Add {
            title,
            description,
            periodicity,
        } => {
            let id = habits.add_habit(title, description, periodicity)?;
            println!("Created habit #{}", id);
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            habits.edit_habit(*id, title.as_deref(), description.as_deref())?;
            println!("Updated habit #{}", id);
        }
        Command::Delete { id } => {
            habits.delete_habit(*id)?;
            println!("Deleted habit #{}", id);
        }
        Command::Purge { yes } => {
            let Some(owner) = habits.owner().cloned() else {
                bail!("No owner selected, pass --owner or set HABITUAL_OWNER");
            };
            if !yes {
                bail!("Refusing to delete all habits of {} without --yes", owner);
            }
            let count = habits.delete_all_for_owner(&owner)?;
            println!("Deleted {} habit(s) of {}", count, owner);
        }
        Command::Check { id } => match habits.check_habit(*id)? {
            CheckOutcome::Checked => {
                let habit = habits.habit(*id, false)?;
                println!("Checked #{} {} (streak {})", id, habit.title(), habit.streak());
            }
            CheckOutcome::AlreadySatisfied => {
                println!("#{} is already done for this period", id);
            }
        },
        Command::List { periodicity, sort } => {
            let listed = match (periodicity, sort) {
                (Some(_), Some(_)) => {
                    bail!("--periodicity and --sort cannot be combined")
                }
                (Some(periodicity), None) => habits.filter_by_periodicity(periodicity, false)?,
                (None, Some(SortOrder::Streak)) => habits.sort_by_streak(false)?,
                (None, Some(SortOrder::LongestStreak)) => habits.sort_by_longest_streak(false)?,
                (None, Some(SortOrder::Created)) => habits.sort_by_created_ascending(false)?,
                (None, None) => habits.habits(false)?.iter().collect(),
            };
            print_habits(&listed);
        }
        Command::Unchecked => {
            let unchecked = habits.list_unchecked(false)?;
            print_habits(&unchecked);
        }
        Command::Breaks { last_month } => {
            let ranking = if *last_month {
                habits.rank_by_last_month_breaks(false)?
            } else {
                habits.rank_by_total_breaks(false)?
            };
            print_ranking(&ranking);
        }
        Command::Show { id, json } => {
            let now = clock.now();
            let habit = habits.habit(*id, false)?;
            if *json {
                let record = serde_json::to_string_pretty(&habit.to_record())
                    .context("Failed to serialize habit")?;
                println!("{}", record);
            } else {
                print_habit(habit, now);
            }
        }
        Command::Seed => {
            let ids = habits.seed_demo()?;
            println!(
                "Added {} demo habit(s) for {} and {}",
                ids.len(),
                DEMO_OWNER,
                DEMO_ALT_OWNER
            );
        }
        Command::Periodicities => {
            for (periodicity, code) in habits.periodicities() {
                println!("{}: {}", periodicity, code);
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_config_if_present(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    let config_found = loaded.is_some();
    let mut settings = loaded.unwrap_or_default();
    if let Some(data_dir) = &args.data_dir {
        settings.storage.data_dir = data_dir.clone();
    }

    init_logging(&args, &settings.logging)?;

    if !config_found {
        info!(config_path = %args.config.display(), "Config file not found, using defaults");
    }

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %args.config.display(),
        mock_time = habitual_util::is_mock_time_active(),
        "habitual starting"
    );

    run(&args, settings)
}
