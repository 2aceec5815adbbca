use chrono::NaiveDate;
use crate::models::Task;

/// Fixed daily payout target: the default weekly salary of 4000 spread over 7 days.
pub const DAILY_SALARY_TARGET: u64 = 572;

/// Result of splitting a day's target across the stars scheduled for that day.
#[derive(Debug, Clone, PartialEq)]
pub struct StarValue<'a> {
    pub active_tasks: Vec<&'a Task>,
    pub total_stars: u64,
    pub value_per_star: u64,
}

impl StarValue<'_> {
    /// Amount paid when every active task is completed.
    pub fn full_payout(&self) -> u64 {
        self.value_per_star * self.total_stars
    }

    /// Part of `target` lost to floor division even on a perfect day.
    pub fn remainder(&self, target: u64) -> u64 {
        target.saturating_sub(self.full_payout())
    }
}

/// Computes the per-star value of `date`.
///
/// Only tasks scheduled on the date's weekday count. The value is
/// `floor(target / total_stars)`, or 0 when nothing is scheduled, so the
/// full payout never exceeds `target`.
pub fn compute_star_value(tasks: &[Task], date: NaiveDate, target: u64) -> StarValue<'_> {
    let active_tasks: Vec<&Task> = tasks.iter().filter(|t| t.is_scheduled_on(date)).collect();
    let total_stars: u64 = active_tasks.iter().map(|t| u64::from(t.stars.get())).sum();
    let value_per_star = if total_stars > 0 { target / total_stars } else { 0 };
    StarValue { active_tasks, total_stars, value_per_star }
}
