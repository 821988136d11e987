use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use opero_core::gamification::TaskType;
use opero_core::ui::Theme;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "opero")]
#[command(about = "OPERO CLI - real-estate CRM service tools", long_about = None)]
struct Cli {
    /// Root directory for config and data (overrides OPERO_HOME)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the level for an XP total
    Level { xp: u32 },
    /// Show what demo visitors may do
    Demo {
        /// A single action, e.g. delete_record
        action: Option<String>,
    },
    /// Normalize a backend error into its user-facing message
    Error {
        #[arg(long)]
        code: Option<String>,
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Read or change persisted UI preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Daily tasks of one user
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
    /// Daily task job for every user
    Scheduler {
        #[command(subcommand)]
        action: SchedulerAction,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    Show,
    ToggleSidebar,
    ToggleCollapsed,
    Theme {
        #[arg(value_parser = parse_theme)]
        theme: Theme,
    },
}

#[derive(Subcommand)]
enum TasksAction {
    /// Create the day's task set if missing
    Init {
        #[arg(long)]
        user: String,
        /// Defaults to today (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record one step of a task
    Progress {
        #[arg(long)]
        user: String,
        #[arg(long, value_parser = parse_task)]
        task: TaskType,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum SchedulerAction {
    /// Run a single pass and print the report
    RunOnce {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run on the configured interval until Ctrl-C
    Run,
}

fn parse_theme(value: &str) -> Result<Theme, String> {
    value
        .parse()
        .map_err(|_| format!("unknown theme '{value}' (light, dark, system)"))
}

fn parse_task(value: &str) -> Result<TaskType, String> {
    value.parse().map_err(|_| format!("unknown task type '{value}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_dir.as_deref())?;
    let paths = opero_infrastructure::OperoPaths::new(cli.home.as_deref());
    tracing::debug!(?paths, "Resolved OPERO paths");

    match cli.command {
        Commands::Level { xp } => commands::level::run(xp)?,
        Commands::Demo { action } => commands::demo::run(action.as_deref())?,
        Commands::Error { code, message } => commands::error::run(code, &message)?,
        Commands::Prefs { action } => match action {
            PrefsAction::Show => commands::prefs::show(&paths)?,
            PrefsAction::ToggleSidebar => commands::prefs::toggle_sidebar(&paths)?,
            PrefsAction::ToggleCollapsed => commands::prefs::toggle_collapsed(&paths)?,
            PrefsAction::Theme { theme } => commands::prefs::set_theme(&paths, theme)?,
        },
        Commands::Tasks { action } => match action {
            TasksAction::Init { user, date } => commands::tasks::init(&paths, &user, date).await?,
            TasksAction::Progress { user, task, date } => {
                commands::tasks::progress(&paths, &user, task, date).await?
            }
        },
        Commands::Scheduler { action } => match action {
            SchedulerAction::RunOnce { date } => commands::scheduler::run_once(&paths, date).await?,
            SchedulerAction::Run => commands::scheduler::run(&paths).await?,
        },
    }

    Ok(())
}
