use chorestar::models::{CompletionMap, Decision, RewardOutcome, Stars, Task, TaskStatus, UserProfile, Weekdays};
use chorestar::settlement::{reward_outcome, settle};
use chorestar::stars::DAILY_SALARY_TARGET;
use chrono::NaiveDate;

fn task(id: &str, stars: u8, days: Vec<u8>) -> Task {
    Task {
        id: id.into(),
        title: id.into(),
        icon: "⭐".into(),
        stars: Stars::try_from(stars).unwrap(),
        days: Weekdays::try_from(days).unwrap(),
    }
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 30).unwrap()
}

fn profile(balance: u64) -> UserProfile {
    UserProfile {
        user_id: "kid_001".into(),
        balance,
        weekly_base_salary: 4000,
        last_salary_date: None,
        parent_password_hash: None,
        version: 3,
    }
}

fn household() -> Vec<Task> {
    vec![
        task("homework", 3, vec![1, 2, 3, 4, 5]),
        task("teeth", 1, vec![0, 1, 2, 3, 4, 5, 6]),
    ]
}

#[test]
fn test_all_completed_pays_full_split() {
    let completion: CompletionMap = [("homework", Decision::Completed), ("teeth", Decision::Completed)]
        .into_iter()
        .collect();
    let s = settle(&profile(1000), &household(), &completion, tuesday(), DAILY_SALARY_TARGET).unwrap();

    assert_eq!(s.log.total_stars, 4);
    assert_eq!(s.log.star_value, 143);
    assert_eq!(s.total_reward(), 572);
    assert_eq!(s.new_balance, 1572);
    assert_eq!(s.log.base_salary, 572);
    assert_eq!(s.log.date, tuesday());
    assert_eq!(s.profile_version, 3);
}

#[test]
fn test_partial_completion() {
    let completion: CompletionMap = [("homework", Decision::Completed), ("teeth", Decision::Failed)]
        .into_iter()
        .collect();
    let s = settle(&profile(0), &household(), &completion, tuesday(), DAILY_SALARY_TARGET).unwrap();

    assert_eq!(s.total_reward(), 429);
    assert_eq!(s.log.net_income, 429);
    assert_eq!(s.log.actual_amount, 429);
    assert_eq!(s.log.deduction, 0);
    assert_eq!(
        s.log.tasks_status,
        vec![
            TaskStatus { task_id: "homework".into(), completed: true, deduction: 0 },
            TaskStatus { task_id: "teeth".into(), completed: false, deduction: 0 },
        ]
    );
}

#[test]
fn test_nothing_completed_leaves_balance() {
    let completion: CompletionMap = [("homework", Decision::Failed)].into_iter().collect();
    let s = settle(&profile(250), &household(), &completion, tuesday(), DAILY_SALARY_TARGET).unwrap();
    assert_eq!(s.total_reward(), 0);
    assert_eq!(s.new_balance, 250);
    assert_eq!(s.log.tasks_status.len(), 2);
    assert!(s.log.tasks_status.iter().all(|t| !t.completed && t.deduction == 0));
}

#[test]
fn test_undecided_counts_as_not_completed() {
    let s = settle(&profile(0), &household(), &CompletionMap::new(), tuesday(), DAILY_SALARY_TARGET).unwrap();
    assert_eq!(s.total_reward(), 0);
    assert_eq!(s.log.tasks_status.len(), 2);
}

#[test]
fn test_rounding_gap_on_perfect_day() {
    let tasks = vec![task("a", 1, vec![2]), task("b", 2, vec![2])];
    let completion: CompletionMap = [("a", Decision::Completed), ("b", Decision::Completed)]
        .into_iter()
        .collect();
    let s = settle(&profile(0), &tasks, &completion, tuesday(), 572).unwrap();
    assert_eq!(s.log.star_value, 190);
    assert_eq!(s.total_reward(), 570);
    assert_eq!(572 - s.total_reward(), 2);
}

#[test]
fn test_empty_day_is_flagged() {
    let tasks = vec![task("weekend", 2, vec![0, 6])];
    let s = settle(&profile(10), &tasks, &CompletionMap::new(), tuesday(), DAILY_SALARY_TARGET).unwrap();
    assert!(s.is_empty());
    assert_eq!(s.log.total_stars, 0);
    assert_eq!(s.log.star_value, 0);
    assert_eq!(s.total_reward(), 0);
    assert_eq!(s.new_balance, 10);
}

#[test]
fn test_unscheduled_completion_is_ignored() {
    let tasks = vec![task("weekend", 2, vec![0, 6]), task("daily", 1, vec![0, 1, 2, 3, 4, 5, 6])];
    let completion: CompletionMap = [("weekend", Decision::Completed), ("daily", Decision::Completed)]
        .into_iter()
        .collect();
    let s = settle(&profile(0), &tasks, &completion, tuesday(), 572).unwrap();
    assert_eq!(s.log.tasks_status.len(), 1);
    assert_eq!(s.total_reward(), 572);
}

#[test]
fn test_reward_outcome() {
    let t = task("homework", 3, vec![2]);
    let mut completion = CompletionMap::new();
    assert_eq!(reward_outcome(&t, &completion, 100), RewardOutcome::Forfeited);
    completion.mark("homework", Decision::Completed);
    assert_eq!(reward_outcome(&t, &completion, 100), RewardOutcome::Earned(300));
    assert_eq!(RewardOutcome::Forfeited.amount(), 0);
}

#[test]
fn test_apply_to_keeps_version() {
    let completion: CompletionMap = [("teeth", Decision::Completed)].into_iter().collect();
    let p = profile(5);
    let s = settle(&p, &household(), &completion, tuesday(), DAILY_SALARY_TARGET).unwrap();
    let updated = s.apply_to(&p);
    assert_eq!(updated.balance, 5 + 143);
    assert_eq!(updated.version, p.version);
}
