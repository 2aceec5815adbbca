use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Weekday index of a date, 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Short names for weekday indices.
pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A task's importance weight, always 1, 2 or 3.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    pub const ONE: Stars = Stars(1);
    pub const TWO: Stars = Stars(2);
    pub const THREE: Stars = Stars(3);

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=3 => Ok(Stars(value)),
            _ => Err(format!("star weight must be 1, 2 or 3 (got {})", value)),
        }
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> u8 {
        stars.0
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", "★".repeat(self.0 as usize))
    }
}

/// Set of weekday indices on which a task is scheduled.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Weekdays(BTreeSet<u8>);

impl Weekdays {
    pub fn every_day() -> Weekdays {
        Weekdays((0..7).collect())
    }

    pub fn contains(&self, index: u8) -> bool {
        self.0.contains(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// Parses a comma separated list such as `1-5`, `0,6` or `mon,wed,fri`.
    pub fn parse(input: &str) -> Result<Weekdays, String> {
        let mut days = BTreeSet::new();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("all") || part == "*" {
                days.extend(0..7);
            } else if let Some((from, to)) = part.split_once('-') {
                let (from, to) = (parse_day(from)?, parse_day(to)?);
                if from > to {
                    return Err(format!("invalid day range '{}'", part));
                }
                days.extend(from..=to);
            } else {
                days.insert(parse_day(part)?);
            }
        }
        Ok(Weekdays(days))
    }
}

fn parse_day(s: &str) -> Result<u8, String> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return if n < 7 { Ok(n) } else { Err(format!("weekday index out of range: {}", n)) };
    }
    WEEKDAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(s))
        .map(|i| i as u8)
        .ok_or_else(|| format!("unknown weekday '{}'", s))
}

impl TryFrom<Vec<u8>> for Weekdays {
    type Error = String;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        if let Some(bad) = days.iter().find(|d| **d > 6) {
            return Err(format!("weekday index out of range: {}", bad));
        }
        Ok(Weekdays(days.into_iter().collect()))
    }
}

impl From<Weekdays> for Vec<u8> {
    fn from(days: Weekdays) -> Vec<u8> {
        days.0.into_iter().collect()
    }
}

impl fmt::Display for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() == 7 {
            return write!(f, "every day");
        }
        let names: Vec<&str> = self.iter().map(|d| WEEKDAY_NAMES[d as usize]).collect();
        write!(f, "{}", names.join(","))
    }
}

/// A chore the child can do on its scheduled weekdays.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier within one user's task list.
    pub id: String,
    pub title: String,
    /// Emoji shown next to the title.
    pub icon: String,
    pub stars: Stars,
    /// Weekdays on which the task is active.
    pub days: Weekdays,
}

impl Task {
    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        self.days.contains(weekday_index(date))
    }
}

/// A parent's verdict on one task during settlement.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Undecided,
    Completed,
    Failed,
}

/// Decisions keyed by task id. Ids not present read as [`Decision::Undecided`].
#[derive(Debug, Clone, Default)]
pub struct CompletionMap(HashMap<String, Decision>);

impl CompletionMap {
    pub fn new() -> CompletionMap {
        CompletionMap::default()
    }

    pub fn mark(&mut self, task_id: impl Into<String>, decision: Decision) {
        self.0.insert(task_id.into(), decision);
    }

    pub fn decision(&self, task_id: &str) -> Decision {
        self.0.get(task_id).copied().unwrap_or_default()
    }

    pub fn is_completed(&self, task_id: &str) -> bool {
        self.decision(task_id) == Decision::Completed
    }
}

impl<S: Into<String>> FromIterator<(S, Decision)> for CompletionMap {
    fn from_iter<I: IntoIterator<Item = (S, Decision)>>(iter: I) -> Self {
        CompletionMap(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// What a single task contributed to a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardOutcome {
    Earned(u64),
    Forfeited,
}

impl RewardOutcome {
    pub fn amount(self) -> u64 {
        match self {
            RewardOutcome::Earned(amount) => amount,
            RewardOutcome::Forfeited => 0,
        }
    }
}

/// Per-task record stored inside a [`DailyLog`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub task_id: String,
    pub completed: bool,
    /// Always 0 under the reward-only policy.
    #[serde(default)]
    pub deduction: u64,
}

impl TaskStatus {
    pub fn from_outcome(task_id: impl Into<String>, outcome: RewardOutcome) -> TaskStatus {
        TaskStatus {
            task_id: task_id.into(),
            completed: matches!(outcome, RewardOutcome::Earned(_)),
            deduction: 0,
        }
    }
}

/// The immutable record of one day's settlement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DailyLog {
    pub date: NaiveDate,
    /// Daily salary target in effect when the day was settled.
    pub base_salary: u64,
    pub tasks_status: Vec<TaskStatus>,
    pub net_income: u64,
    pub total_stars: u64,
    pub star_value: u64,
    #[serde(default)]
    pub deduction: u64,
    /// Same value as `net_income`, kept for older readers.
    #[serde(default)]
    pub actual_amount: u64,
}

impl DailyLog {
    pub fn completed_count(&self) -> usize {
        self.tasks_status.iter().filter(|s| s.completed).count()
    }
}

/// A child's account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    /// Running balance in whole currency units.
    pub balance: u64,
    pub weekly_base_salary: u64,
    pub last_salary_date: Option<NaiveDate>,
    /// Hash guarding parent actions. `None` until a parent sets a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_password_hash: Option<String>,
    /// Optimistic concurrency token, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

pub const DEFAULT_WEEKLY_SALARY: u64 = 4000;

impl UserProfile {
    pub fn new(user_id: impl Into<String>, weekly_base_salary: u64) -> UserProfile {
        UserProfile {
            user_id: user_id.into(),
            balance: 0,
            weekly_base_salary,
            last_salary_date: None,
            parent_password_hash: None,
            version: 0,
        }
    }
}

/// The household chores a fresh account starts with.
pub fn default_tasks() -> Vec<Task> {
    let weekdays = Weekdays::parse("1-5").unwrap_or_default();
    let school_days = Weekdays::parse("0-5").unwrap_or_default();
    vec![
        Task {
            id: "task_homework".into(),
            title: "Finish homework carefully".into(),
            icon: "📝".into(),
            stars: Stars::THREE,
            days: weekdays,
        },
        Task {
            id: "task_piano".into(),
            title: "Practice piano for 20 minutes".into(),
            icon: "🎹".into(),
            stars: Stars::TWO,
            days: Weekdays::every_day(),
        },
        Task {
            id: "task_bag".into(),
            title: "Pack the school bag".into(),
            icon: "🎒".into(),
            stars: Stars::ONE,
            days: school_days,
        },
        Task {
            id: "task_teeth".into(),
            title: "Brush teeth morning and night".into(),
            icon: "🦷".into(),
            stars: Stars::ONE,
            days: Weekdays::every_day(),
        },
    ]
}
