mod args;
mod calendar_cmds;
mod classification_cmds;
mod config;
mod plan_cmds;
mod reps_cmd;
mod session_cmds;
mod template_cmds;
mod unit_cmds;

#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use stride_core::{Caller, EngineError, OwnerOnly, PlanStructureManager};
use stride_db::models::{Discipline, PlanKind, UnitType, WorkType};
use stride_db::pool;

use args::parse_date;
use config::StrideConfig;
use reps_cmd::RepsArgs;

#[derive(Parser)]
#[command(name = "stride", version, about = "Training plan hierarchy and reorganization engine")]
struct Cli {
    /// Database URL (overrides STRIDE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Caller id to act as (overrides STRIDE_CALLER env var)
    #[arg(long, global = true)]
    caller: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a stride config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/stride")]
        db_url: String,
        /// Caller id to store (a new one is generated when omitted)
        #[arg(long)]
        caller_id: Option<Uuid>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create and migrate the stride database
    DbInit,
    /// Print a shell completion script
    Completions {
        shell: Shell,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Week operations
    Week {
        #[command(subcommand)]
        command: WeekCommands,
    },
    /// Day operations
    Day {
        #[command(subcommand)]
        command: DayCommands,
    },
    /// Session operations
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Move unit operations
    Unit {
        #[command(subcommand)]
        command: UnitCommands,
    },
    /// Repetition lap operations
    Lap {
        #[command(subcommand)]
        command: LapCommands,
    },
    /// Generate repetition sequences
    Reps {
        #[command(subcommand)]
        command: RepsCommands,
    },
    /// Session and day templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Week classifications
    Period {
        #[command(subcommand)]
        command: PeriodCommands,
    },
    /// Technique tags for move units
    Technique {
        #[command(subcommand)]
        command: TechniqueCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a plan with its weeks and days
    Create {
        /// Plan name
        name: String,
        /// Plan kind: template_weeks, yearly_plan, completed_log
        #[arg(long, default_value = "yearly_plan")]
        kind: PlanKind,
        /// First day of the plan
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,
        /// Number of weeks (defaults to the configured span for the kind)
        #[arg(long)]
        weeks: Option<i32>,
        /// Period given to every week
        #[arg(long)]
        period: Option<Uuid>,
    },
    /// Show a plan's hierarchy (or list your plans)
    Show {
        /// Plan ID to show (omit to list all)
        plan_id: Option<Uuid>,
        /// Print the hierarchy as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every week and rebuild the plan's structure
    Rebuild {
        plan_id: Uuid,
        /// Required: rebuilding deletes all sessions
        #[arg(long)]
        confirm: bool,
    },
    /// Delete a plan and everything under it
    Delete {
        plan_id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum WeekCommands {
    /// Copy every day's sessions from one week into another
    Copy {
        source_week_id: Uuid,
        target_week_id: Uuid,
        /// Replace the target days' sessions instead of appending
        #[arg(long)]
        replace: bool,
        /// Confirm replacing occupied days
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
pub enum DayCommands {
    /// Create the day for a date inside a week, or return the existing one
    Ensure {
        week_id: Uuid,
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
    /// Move a day with its sessions into another week
    Move {
        day_id: Uuid,
        target_week_id: Uuid,
        /// Position within the target week (accepted, not used)
        #[arg(long)]
        index: Option<usize>,
        /// Delete a day already holding the new date
        #[arg(long)]
        confirm: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Add a session after a day's existing ones
    Create {
        day_id: Uuid,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        notes: Option<String>,
        /// Planned duration in minutes
        #[arg(long)]
        duration: Option<i32>,
    },
    /// Deep-copy a session onto a day
    Copy {
        session_id: Uuid,
        target_day_id: Uuid,
    },
    /// Move a session onto a day
    Move {
        session_id: Uuid,
        target_day_id: Uuid,
        /// Session on the target day to replace
        #[arg(long)]
        replace: Option<Uuid>,
        /// Confirm replacing the target day's only session
        #[arg(long)]
        confirm: bool,
    },
    /// Exchange a session's day and number with another session
    Switch {
        session_id: Uuid,
        target_day_id: Uuid,
        /// Session to switch with (defaults to the target day's only session)
        #[arg(long)]
        with: Option<Uuid>,
    },
    /// Delete a session with its move units and laps
    Delete {
        session_id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum UnitCommands {
    /// Append a move unit to a session
    Add {
        session_id: Uuid,
        #[arg(long)]
        discipline: Discipline,
        /// standard, annotation or manual
        #[arg(long = "type", default_value = "standard")]
        unit_type: UnitType,
        /// primary or secondary
        #[arg(long)]
        work_type: Option<WorkType>,
        #[arg(long)]
        description: Option<String>,
        /// Technique tag
        #[arg(long)]
        technique: Option<Uuid>,
    },
    /// Move move units into a session
    Move {
        #[command(flatten)]
        batch: UnitBatchArgs,
    },
    /// Copy move units into a session
    Copy {
        #[command(flatten)]
        batch: UnitBatchArgs,
    },
    /// Exchange the session and letter of two move units
    Switch {
        a: Uuid,
        b: Uuid,
    },
    /// Set or clear a move unit's work type
    WorkType {
        unit_id: Uuid,
        /// primary or secondary (omit to clear)
        work_type: Option<WorkType>,
    },
    /// Delete a move unit and its laps
    Delete {
        unit_id: Uuid,
    },
}

/// Arguments shared by `unit move` and `unit copy`.
#[derive(clap::Args)]
pub struct UnitBatchArgs {
    /// Units to place, in order
    #[arg(required = true)]
    pub unit_ids: Vec<Uuid>,
    /// Target session
    #[arg(long)]
    pub to: Uuid,
    /// Insert before this unit of the target session
    #[arg(long, conflicts_with_all = ["after", "replace"])]
    pub before: Option<Uuid>,
    /// Insert after this unit of the target session
    #[arg(long, conflicts_with = "replace")]
    pub after: Option<Uuid>,
    /// Replace this unit of the target session
    #[arg(long)]
    pub replace: Option<Uuid>,
    /// Confirm deleting the replaced unit
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Subcommand)]
pub enum LapCommands {
    /// Append a lap to a move unit
    Add {
        unit_id: Uuid,
        #[arg(long)]
        distance: Option<i32>,
        #[arg(long)]
        reps: Option<i32>,
        #[arg(long)]
        load: Option<f64>,
        /// Pace in seconds
        #[arg(long)]
        pace: Option<i32>,
        /// Rest in seconds
        #[arg(long)]
        rest: Option<i32>,
        /// Duration in seconds
        #[arg(long)]
        duration: Option<i32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List a move unit's laps
    List {
        unit_id: Uuid,
    },
    /// Delete a lap
    Delete {
        lap_id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum RepsCommands {
    /// Print a generated sequence without storing it
    Preview {
        #[command(flatten)]
        spec: RepsArgs,
    },
    /// Generate a sequence and append it to a move unit
    Populate {
        unit_id: Uuid,
        #[command(flatten)]
        spec: RepsArgs,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Save a session as a template
    SaveSession {
        session_id: Uuid,
        #[arg(long)]
        name: String,
    },
    /// Save a day's sessions as a template
    SaveDay {
        day_id: Uuid,
        #[arg(long)]
        name: String,
    },
    /// Apply a template to a day
    Apply {
        template_id: Uuid,
        target_day_id: Uuid,
    },
    /// List your templates
    List,
    /// Delete one of your templates
    Delete {
        template_id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum PeriodCommands {
    /// Create a period
    Add {
        name: String,
        /// Display color, e.g. "#3b82f6"
        #[arg(long)]
        color: Option<String>,
    },
    /// List your periods
    List,
    /// Delete a period; weeks using it keep their content
    Delete {
        period_id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum TechniqueCommands {
    /// Create a technique tag, or show the existing one
    Add {
        name: String,
    },
    /// List technique tags
    List,
}

/// Execute the `stride init` command: write config file.
fn cmd_init(db_url: &str, caller_id: Option<Uuid>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let caller_id = caller_id.unwrap_or_else(Uuid::new_v4);
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        operator: config::OperatorSection { caller_id },
        engine: Default::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url       = {db_url}");
    println!("  operator.caller_id = {caller_id}");
    println!();
    println!("Next: run `stride db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `stride db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &StrideConfig) -> anyhow::Result<()> {
    println!("Initializing stride database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("stride db-init complete.");
    Ok(())
}

fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}

/// Run a command that needs the engine, closing the pool afterwards.
async fn run_engine_command(command: Commands, resolved: &StrideConfig) -> anyhow::Result<()> {
    let caller = Caller::new(resolved.caller_id()?);
    debug!(caller = %caller.id, "running as caller");
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let manager = PlanStructureManager::new(db_pool, Arc::new(OwnerOnly), resolved.engine.clone());

    let result = match command {
        Commands::Plan { command } => plan_cmds::run_plan_command(command, &manager, &caller).await,
        Commands::Week { command } => calendar_cmds::run_week_command(command, &manager, &caller).await,
        Commands::Day { command } => calendar_cmds::run_day_command(command, &manager, &caller).await,
        Commands::Session { command } => {
            session_cmds::run_session_command(command, &manager, &caller).await
        }
        Commands::Unit { command } => unit_cmds::run_unit_command(command, &manager, &caller).await,
        Commands::Lap { command } => unit_cmds::run_lap_command(command, &manager, &caller).await,
        Commands::Reps { command } => reps_cmd::run_reps_command(command, &manager, &caller).await,
        Commands::Template { command } => {
            template_cmds::run_template_command(command, &manager, &caller).await
        }
        Commands::Period { command } => {
            classification_cmds::run_period_command(command, &manager, &caller).await
        }
        Commands::Technique { command } => {
            classification_cmds::run_technique_command(command, &manager).await
        }
        Commands::Init { .. } | Commands::DbInit | Commands::Completions { .. } => Ok(()),
    };

    manager.pool().close().await;
    result
}

/// Print a conflict with its resolution hint and exit non-zero. Other
/// errors are returned unchanged.
fn report_conflict(err: anyhow::Error) -> anyhow::Error {
    if let Some(engine_err) = err.downcast_ref::<EngineError>() {
        if engine_err.is_resolvable() {
            eprintln!("conflict: {engine_err}");
            eprintln!("hint: re-run with --confirm to resolve it");
            std::process::exit(2);
        }
    }
    err
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            caller_id,
            force,
        } => {
            cmd_init(&db_url, caller_id, force)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
        Commands::Reps {
            command: RepsCommands::Preview { spec },
        } => {
            reps_cmd::cmd_preview(&spec)?;
        }
        Commands::DbInit => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), cli.caller)?;
            cmd_db_init(&resolved).await?;
        }
        command => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), cli.caller)?;
            run_engine_command(command, &resolved).await.map_err(report_conflict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn unit_move_takes_an_ordered_batch() {
        let (a, b, to) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (a_arg, b_arg, to_arg) = (a.to_string(), b.to_string(), to.to_string());
        let cli = Cli::try_parse_from([
            "stride",
            "unit",
            "move",
            a_arg.as_str(),
            b_arg.as_str(),
            "--to",
            to_arg.as_str(),
            "--after",
            to_arg.as_str(),
        ])
        .unwrap();
        match cli.command {
            Commands::Unit {
                command: UnitCommands::Move { batch },
            } => {
                assert_eq!(batch.unit_ids, [a, b]);
                assert_eq!(batch.to, to);
                assert_eq!(batch.after, Some(to));
                assert!(!batch.confirm);
            }
            _ => panic!("expected unit move"),
        }
    }

    #[test]
    fn before_and_after_are_exclusive() {
        let id = Uuid::new_v4().to_string();
        let id = id.as_str();
        let result = Cli::try_parse_from([
            "stride", "unit", "copy", id, "--to", id, "--before", id, "--after", id,
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn plan_create_parses_kind_and_date() {
        let cli = Cli::try_parse_from([
            "stride",
            "--caller",
            "6f1c8a52-2b7e-4c1f-9d0a-3e5b7c9d1f20",
            "plan",
            "create",
            "Base block",
            "--kind",
            "template_weeks",
            "--start",
            "05.01.2026",
        ])
        .unwrap();
        assert!(cli.caller.is_some());
        match cli.command {
            Commands::Plan {
                command:
                    PlanCommands::Create {
                        name,
                        kind,
                        start,
                        weeks,
                        ..
                    },
            } => {
                assert_eq!(name, "Base block");
                assert_eq!(kind, PlanKind::TemplateWeeks);
                assert_eq!(start, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
                assert_eq!(weeks, None);
            }
            _ => panic!("expected plan create"),
        }
    }

    #[test]
    fn unknown_discipline_is_rejected() {
        let id = Uuid::new_v4().to_string();
        let result =
            Cli::try_parse_from(["stride", "unit", "add", id.as_str(), "--discipline", "curling"]);
        assert!(result.is_err());
    }
}
