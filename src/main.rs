//! # Chorestar
//!
//! A terminal chore tracker for kids. Each chore is worth 1-3 stars and runs on
//! chosen weekdays. At the end of the day a parent confirms what was done and
//! the day's salary target is paid out star by star. Every Monday the weekly
//! base salary is credited.
//!
//! ## Usage
//!
//! ```bash
//! chorestar init
//! chorestar                      # today's tasks and balance
//! chorestar settle --done task_homework --done task_teeth --failed task_piano
//! chorestar settle --dry-run --done task_homework
//! chorestar task add "Water the plants" --icon 🪴 --stars 2 --days mon,thu
//! chorestar logs --limit 7
//! chorestar parent-password s3cret
//! chorestar --parent-password s3cret salary 3500
//! ```
//!
//! ## Data Storage
//!
//! Data is saved per user under the local data directory:
//! *   Linux: `~/.local/share/chorestar/<user>/`
//! *   macOS: `~/Library/Application Support/chorestar/<user>/`
//! *   Windows: `%APPDATA%\chorestar\<user>\`
//!
//! Override it with the `CHORESTAR_DATA` environment variable.

use std::io;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use chorestar::auth::{resolve_user, StaticTokens};
use chorestar::clock::{Clock, FixedClock, SystemClock};
use chorestar::commands::*;
use chorestar::config::Config;
use chorestar::error::Result;
use chorestar::storage::JsonStore;

#[derive(Parser)]
#[command(name = "chorestar")]
#[command(about = "Chore rewards and weekly allowance tracker", long_about = None)]
struct Cli {
    /// Access token identifying the user
    #[arg(long, global = true, env = "CHORESTAR_TOKEN")]
    token: Option<String>,
    /// Parent password for settling and changing tasks or salary
    #[arg(long, global = true, env = "CHORESTAR_PARENT_PASSWORD", hide_env_values = true)]
    parent_password: Option<String>,
    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the profile and default tasks
    Init {
        /// Weekly base salary
        #[arg(short, long)]
        salary: Option<u64>,
    },
    /// Show balance and today's tasks (credits the weekly salary on Mondays)
    Status,
    /// Settle today: pay out for the tasks marked done
    Settle {
        /// Task id completed today (repeatable)
        #[arg(short, long)]
        done: Vec<String>,
        /// Task id not completed today (repeatable)
        #[arg(short, long)]
        failed: Vec<String>,
        /// Only show what would be paid
        #[arg(long)]
        dry_run: bool,
        /// Record a settlement even when no task is scheduled
        #[arg(long)]
        allow_empty: bool,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show past settlements
    Logs {
        /// Only the most recent N days
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Set the weekly base salary
    Salary {
        amount: u64,
    },
    /// Set or change the parent password
    ParentPassword {
        /// The new password
        new: String,
    },
    /// Delete all data of the current user
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Emoji shown next to the title
        #[arg(short, long)]
        icon: Option<String>,
        /// Star weight, 1 to 3
        #[arg(short, long, default_value_t = 1)]
        stars: u8,
        /// Weekdays, e.g. "1-5", "sat,sun" or "all" (0 = Sunday)
        #[arg(short, long, default_value = "all")]
        days: String,
    },
    /// List tasks
    List,
    /// Edit a task
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New icon
        #[arg(short, long)]
        icon: Option<String>,
        /// New star weight
        #[arg(short, long)]
        stars: Option<u8>,
        /// New weekdays
        #[arg(short, long)]
        days: Option<String>,
    },
    /// Remove a task
    Remove {
        id: String,
    },
}

fn context(cli: &Cli) -> Result<Context> {
    let config = Config::load()?;
    let auth = StaticTokens::new(config.tokens.clone());
    let user_id = resolve_user(&auth, cli.token.as_deref(), &config.default_user)?;
    let clock: Box<dyn Clock> = match cli.date {
        Some(d) => Box::new(FixedClock(d)),
        None => Box::new(SystemClock),
    };
    Ok(Context {
        store: JsonStore::new(config.data_dir()),
        clock,
        config,
        user_id,
        parent_password: cli.parent_password.clone(),
    })
}

fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => {
                eprintln!("Unsupported shell: {}", shell);
                return Ok(());
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "chorestar", &mut io::stdout());
        return Ok(());
    }

    let ctx = context(&cli)?;
    log::debug!("user {} on {}", ctx.user_id, ctx.clock.today());
    match cli.command {
        Some(Commands::Init { salary }) => cmd_init(&ctx, salary, false),
        Some(Commands::Status) | None => cmd_status(&ctx),
        Some(Commands::Settle { done, failed, dry_run, allow_empty }) => {
            cmd_settle(&ctx, done, failed, dry_run, allow_empty, false)
        }
        Some(Commands::Task { command }) => match command {
            TaskCommands::Add { title, icon, stars, days } => cmd_task_add(&ctx, title, icon, stars, days, false).map(|_| ()),
            TaskCommands::List => cmd_task_list(&ctx),
            TaskCommands::Edit { id, title, icon, stars, days } => cmd_task_edit(&ctx, id, title, icon, stars, days, false),
            TaskCommands::Remove { id } => cmd_task_remove(&ctx, id, false),
        },
        Some(Commands::Logs { limit }) => cmd_logs(&ctx, limit),
        Some(Commands::Salary { amount }) => cmd_salary_set(&ctx, amount, false),
        Some(Commands::ParentPassword { new }) => cmd_parent_password(&ctx, &new, false),
        Some(Commands::Reset { force }) => cmd_reset(&ctx, force),
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
