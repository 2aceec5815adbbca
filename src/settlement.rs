use chrono::NaiveDate;
use log::debug;

use crate::error::{LedgerError, Result};
use crate::models::{CompletionMap, DailyLog, RewardOutcome, Task, TaskStatus, UserProfile};
use crate::stars::compute_star_value;

/// Output of one settlement: the log to append and the balance to store.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub log: DailyLog,
    pub new_balance: u64,
    /// Version of the profile the settlement was computed from.
    pub profile_version: u64,
}

impl Settlement {
    /// True when no task was scheduled, which usually means the task list is misconfigured.
    pub fn is_empty(&self) -> bool {
        self.log.tasks_status.is_empty()
    }

    pub fn total_reward(&self) -> u64 {
        self.log.net_income
    }

    /// `profile` with the new balance applied, carrying the version the
    /// settlement was computed from so a store can detect a stale write.
    pub fn apply_to(&self, profile: &UserProfile) -> UserProfile {
        UserProfile {
            balance: self.new_balance,
            version: self.profile_version,
            ..profile.clone()
        }
    }
}

/// Reward for one task under the reward-only policy.
pub fn reward_outcome(task: &Task, completion: &CompletionMap, value_per_star: u64) -> RewardOutcome {
    if completion.is_completed(&task.id) {
        RewardOutcome::Earned(value_per_star * u64::from(task.stars.get()))
    } else {
        RewardOutcome::Forfeited
    }
}

/// Settles `today` for `profile`.
///
/// Completed tasks earn `value_per_star * stars`. Failed and undecided tasks
/// earn nothing and never reduce the balance. The caller is responsible for
/// refusing a second settlement of the same date.
pub fn settle(
    profile: &UserProfile,
    tasks: &[Task],
    completion: &CompletionMap,
    today: NaiveDate,
    target: u64,
) -> Result<Settlement> {
    let star_value = compute_star_value(tasks, today, target);

    let mut tasks_status = Vec::with_capacity(star_value.active_tasks.len());
    let mut total_reward = 0u64;
    for task in &star_value.active_tasks {
        let outcome = reward_outcome(task, completion, star_value.value_per_star);
        debug!("{}: {:?}", task.id, outcome);
        total_reward += outcome.amount();
        tasks_status.push(TaskStatus::from_outcome(task.id.clone(), outcome));
    }

    let new_balance = profile
        .balance
        .checked_add(total_reward)
        .ok_or(LedgerError::BalanceOverflow)?;

    let log = DailyLog {
        date: today,
        base_salary: target,
        tasks_status,
        net_income: total_reward,
        total_stars: star_value.total_stars,
        star_value: star_value.value_per_star,
        deduction: 0,
        actual_amount: total_reward,
    };

    Ok(Settlement { log, new_balance, profile_version: profile.version })
}
