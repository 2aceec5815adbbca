use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use log::warn;

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::models::{CompletionMap, Decision, Stars, Task, Weekdays, DEFAULT_WEEKLY_SALARY};
use crate::storage::{JsonStore, LogFilter, LogStore, TaskStore};

/// Everything a command needs: where data lives, what day it is, and whose data it is.
pub struct Context {
    pub store: JsonStore,
    pub clock: Box<dyn Clock>,
    pub config: Config,
    pub user_id: String,
    /// Parent password given on the command line or in the environment.
    pub parent_password: Option<String>,
}

impl Context {
    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.store, self.clock.as_ref(), self.config.daily_target, self.config.max_retries)
    }

    /// Fails unless the parent password, when one is set, was supplied.
    pub fn require_parent(&self) -> Result<()> {
        self.ledger().authorize_parent(&self.user_id, self.parent_password.as_deref())
    }
}

/// Creates the user's profile and default chores.
pub fn cmd_init(ctx: &Context, weekly_salary: Option<u64>, silent: bool) -> Result<()> {
    let created = ctx
        .ledger()
        .init_user(&ctx.user_id, weekly_salary.unwrap_or(DEFAULT_WEEKLY_SALARY))?;
    if !silent {
        if created {
            println!("Profile '{}' created with default tasks.", ctx.user_id);
        } else {
            println!("Profile '{}' already exists.", ctx.user_id);
        }
    }
    Ok(())
}

/// Shows balance and today's tasks, granting the weekly salary first when due.
pub fn cmd_status(ctx: &Context) -> Result<()> {
    let ledger = ctx.ledger();
    let grant = ledger.open_day(&ctx.user_id)?;
    if grant.granted {
        println!("💰 Weekly salary of {} credited!", grant.profile.weekly_base_salary);
    }
    let summary = ledger.summary(&ctx.user_id)?;

    println!("Balance: {}", summary.profile.balance);
    println!(
        "{} ({}): {} stars, {} per star, target {}",
        summary.date,
        summary.date.format("%A"),
        summary.total_stars,
        summary.value_per_star,
        summary.target
    );
    if summary.remainder > 0 {
        println!("A perfect day pays {} ({} lost to rounding).", summary.target - summary.remainder, summary.remainder);
    }

    if summary.active_tasks.is_empty() {
        println!("No tasks scheduled today.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("ID").add_attribute(Attribute::Bold),
                Cell::new("Task").add_attribute(Attribute::Bold),
                Cell::new("Stars").add_attribute(Attribute::Bold),
                Cell::new("Worth").add_attribute(Attribute::Bold),
            ]);
        for t in &summary.active_tasks {
            table.add_row(vec![
                Cell::new(&t.id),
                Cell::new(format!("{} {}", t.icon, t.title)),
                Cell::new(t.stars).fg(Color::Yellow),
                Cell::new(summary.value_per_star * u64::from(t.stars.get())),
            ]);
        }
        println!("{table}");
    }

    if summary.settled {
        println!("Today is already settled.");
    }
    Ok(())
}

fn completion_from(done: &[String], failed: &[String]) -> CompletionMap {
    done.iter()
        .map(|id| (id.clone(), Decision::Completed))
        .chain(failed.iter().map(|id| (id.clone(), Decision::Failed)))
        .collect()
}

/// Settles today from the parent's verdicts.
///
/// Tasks in neither list stay undecided and earn nothing.
pub fn cmd_settle(
    ctx: &Context,
    done: Vec<String>,
    failed: Vec<String>,
    dry_run: bool,
    allow_empty: bool,
    silent: bool,
) -> Result<()> {
    if let Some(id) = done.iter().find(|id| failed.contains(id)) {
        return Err(LedgerError::InvalidInput(format!("task '{}' marked both done and failed", id)));
    }
    let tasks = ctx.store.list_tasks(&ctx.user_id)?;
    for id in done.iter().chain(failed.iter()) {
        if !tasks.iter().any(|t| &t.id == id) {
            return Err(LedgerError::TaskNotFound(id.clone()));
        }
    }
    let completion = completion_from(&done, &failed);
    if !dry_run {
        ctx.require_parent()?;
    }

    let ledger = ctx.ledger();
    let settlement = if dry_run {
        ledger.preview(&ctx.user_id, &completion)?
    } else {
        ledger.settle_today(&ctx.user_id, &completion, allow_empty)?
    };

    for status in &settlement.log.tasks_status {
        if completion.decision(&status.task_id) == Decision::Undecided {
            warn!("no decision for '{}', counted as not completed", status.task_id);
        }
    }

    if !silent {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Task", "Result", "Earned"]);
        for status in &settlement.log.tasks_status {
            let task = tasks.iter().find(|t| t.id == status.task_id);
            let title = task.map_or(status.task_id.clone(), |t| format!("{} {}", t.icon, t.title));
            let earned = task.map_or(0, |t| {
                if status.completed { settlement.log.star_value * u64::from(t.stars.get()) } else { 0 }
            });
            let (label, color) = match completion.decision(&status.task_id) {
                Decision::Completed => ("Done", Color::Green),
                Decision::Failed => ("Missed", Color::Red),
                Decision::Undecided => ("Undecided", Color::Grey),
            };
            table.add_row(vec![Cell::new(title), Cell::new(label).fg(color), Cell::new(earned)]);
        }
        println!("{table}");
        if dry_run {
            println!("Would earn {} (balance would be {}).", settlement.total_reward(), settlement.new_balance);
        } else {
            println!("Earned {}. New balance: {}.", settlement.total_reward(), settlement.new_balance);
        }
    }
    Ok(())
}

fn slug(title: &str) -> String {
    let s: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    s.split('_').filter(|p| !p.is_empty()).collect::<Vec<_>>().join("_")
}

/// Builds a task id unique within `tasks`.
pub fn next_task_id(tasks: &[Task], title: &str) -> String {
    let base = match slug(title) {
        s if s.is_empty() => "task".to_string(),
        s => format!("task_{}", s),
    };
    if !tasks.iter().any(|t| t.id == base) {
        return base;
    }
    let mut n = 2;
    loop {
        let id = format!("{}_{}", base, n);
        if !tasks.iter().any(|t| t.id == id) {
            return id;
        }
        n += 1;
    }
}

fn parse_stars(stars: u8) -> Result<Stars> {
    Stars::try_from(stars).map_err(LedgerError::InvalidInput)
}

fn parse_days(days: &str) -> Result<Weekdays> {
    let days = Weekdays::parse(days).map_err(LedgerError::InvalidInput)?;
    if days.is_empty() {
        return Err(LedgerError::InvalidInput("a task needs at least one weekday".into()));
    }
    Ok(days)
}

/// Adds a chore and returns its id.
pub fn cmd_task_add(ctx: &Context, title: String, icon: Option<String>, stars: u8, days: String, silent: bool) -> Result<String> {
    ctx.require_parent()?;
    let stars = parse_stars(stars)?;
    let days = parse_days(&days)?;
    let mut tasks = ctx.store.list_tasks(&ctx.user_id)?;
    let id = next_task_id(&tasks, &title);
    tasks.push(Task {
        id: id.clone(),
        title,
        icon: icon.unwrap_or_else(|| "⭐".to_string()),
        stars,
        days,
    });
    ctx.store.save_tasks(&ctx.user_id, &tasks)?;
    if !silent { println!("Task added (id = {})", id); }
    Ok(id)
}

/// Lists every configured chore.
pub fn cmd_task_list(ctx: &Context) -> Result<()> {
    let tasks = ctx.store.list_tasks(&ctx.user_id)?;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    let today = ctx.clock.today();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Task").add_attribute(Attribute::Bold),
            Cell::new("Stars").add_attribute(Attribute::Bold),
            Cell::new("Days").add_attribute(Attribute::Bold),
            Cell::new("Today").add_attribute(Attribute::Bold),
        ]);
    for t in &tasks {
        let (label, color) = if t.is_scheduled_on(today) { ("Yes", Color::Green) } else { ("-", Color::Grey) };
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(format!("{} {}", t.icon, t.title)),
            Cell::new(t.stars).fg(Color::Yellow),
            Cell::new(&t.days),
            Cell::new(label).fg(color),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Edits a chore in place.
pub fn cmd_task_edit(
    ctx: &Context,
    id: String,
    title: Option<String>,
    icon: Option<String>,
    stars: Option<u8>,
    days: Option<String>,
    silent: bool,
) -> Result<()> {
    ctx.require_parent()?;
    let mut tasks = ctx.store.list_tasks(&ctx.user_id)?;
    let t = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| LedgerError::TaskNotFound(id.clone()))?;
    if let Some(s) = stars { t.stars = parse_stars(s)?; }
    if let Some(d) = days { t.days = parse_days(&d)?; }
    if let Some(title) = title { t.title = title; }
    if let Some(icon) = icon { t.icon = icon; }
    ctx.store.save_tasks(&ctx.user_id, &tasks)?;
    if !silent { println!("Task {} updated.", id); }
    Ok(())
}

/// Deletes a chore. Past logs keep referring to its id.
pub fn cmd_task_remove(ctx: &Context, id: String, silent: bool) -> Result<()> {
    ctx.require_parent()?;
    let mut tasks = ctx.store.list_tasks(&ctx.user_id)?;
    let len_before = tasks.len();
    tasks.retain(|t| t.id != id);
    if tasks.len() == len_before {
        return Err(LedgerError::TaskNotFound(id));
    }
    ctx.store.save_tasks(&ctx.user_id, &tasks)?;
    if !silent { println!("Task {} removed.", id); }
    Ok(())
}

/// Shows settlement history, newest first.
pub fn cmd_logs(ctx: &Context, limit: Option<usize>) -> Result<()> {
    let filter = LogFilter { limit, ..LogFilter::default() };
    let logs = ctx.store.list_logs(&ctx.user_id, &filter)?;
    if logs.is_empty() {
        println!("No settlements yet.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Done", "Stars", "Per star", "Target", "Earned"]);
    for log in logs.iter().rev() {
        let color = if log.net_income == log.base_salary {
            Color::Green
        } else if log.net_income == 0 {
            Color::Red
        } else {
            Color::Yellow
        };
        table.add_row(vec![
            Cell::new(log.date),
            Cell::new(format!("{}/{}", log.completed_count(), log.tasks_status.len())),
            Cell::new(log.total_stars),
            Cell::new(log.star_value),
            Cell::new(log.base_salary),
            Cell::new(log.net_income).fg(color),
        ]);
    }
    println!("{table}");
    let total: u64 = logs.iter().map(|l| l.net_income).sum();
    println!("Total earned over {} day(s): {}", logs.len(), total);
    Ok(())
}

/// Sets the weekly base salary credited every Monday.
pub fn cmd_salary_set(ctx: &Context, amount: u64, silent: bool) -> Result<()> {
    ctx.require_parent()?;
    let profile = ctx.ledger().set_weekly_salary(&ctx.user_id, amount)?;
    if !silent { println!("Weekly salary set to {}.", profile.weekly_base_salary); }
    Ok(())
}

/// Sets the parent password. Changing an existing one needs `--parent-password`.
pub fn cmd_parent_password(ctx: &Context, new_password: &str, silent: bool) -> Result<()> {
    ctx.ledger()
        .set_parent_password(&ctx.user_id, ctx.parent_password.as_deref(), new_password)?;
    if !silent { println!("Parent password updated."); }
    Ok(())
}

/// Deletes the user's profile, tasks and logs.
pub fn cmd_reset(ctx: &Context, force: bool) -> Result<()> {
    if ctx.store.has_profile(&ctx.user_id)? {
        ctx.require_parent()?;
    }
    if !force {
        print!("Delete all data for '{}'? This cannot be undone. [y/N] ", ctx.user_id);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    ctx.store.delete_user(&ctx.user_id)?;
    println!("Data for '{}' deleted.", ctx.user_id);
    Ok(())
}
