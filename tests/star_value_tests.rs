use chorestar::models::{Stars, Task, Weekdays};
use chorestar::stars::{compute_star_value, DAILY_SALARY_TARGET};
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

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_filters_by_weekday() {
    let tasks = vec![
        task("weekday", 3, vec![1, 2, 3, 4, 5]),
        task("daily", 1, vec![0, 1, 2, 3, 4, 5, 6]),
    ];

    // Tuesday: both active
    let tue = compute_star_value(&tasks, date("2025-12-30"), DAILY_SALARY_TARGET);
    assert_eq!(tue.active_tasks.len(), 2);
    assert_eq!(tue.total_stars, 4);
    assert_eq!(tue.value_per_star, 143);

    // Saturday: only the daily task
    let sat = compute_star_value(&tasks, date("2026-01-03"), DAILY_SALARY_TARGET);
    assert_eq!(sat.active_tasks.len(), 1);
    assert_eq!(sat.active_tasks[0].id, "daily");
    assert_eq!(sat.total_stars, 1);
    assert_eq!(sat.value_per_star, 572);
}

#[test]
fn test_no_tasks_scheduled_is_zero() {
    let tasks = vec![task("weekday", 2, vec![1, 2, 3, 4, 5])];
    let sun = compute_star_value(&tasks, date("2026-01-04"), DAILY_SALARY_TARGET);
    assert!(sun.active_tasks.is_empty());
    assert_eq!(sun.total_stars, 0);
    assert_eq!(sun.value_per_star, 0);
    assert_eq!(sun.full_payout(), 0);

    let empty = compute_star_value(&[], date("2026-01-04"), DAILY_SALARY_TARGET);
    assert_eq!(empty.value_per_star, 0);
}

#[test]
fn test_full_payout_never_exceeds_target() {
    let monday = date("2025-12-29");
    for a in 1..=3u8 {
        for b in 1..=3u8 {
            for c in 1..=3u8 {
                let tasks = vec![task("a", a, vec![1]), task("b", b, vec![1]), task("c", c, vec![1])];
                for target in [0, 1, 7, 100, 571, 572, 573, 1000] {
                    let sv = compute_star_value(&tasks, monday, target);
                    assert!(sv.full_payout() <= target);
                    assert_eq!(sv.full_payout() + sv.remainder(target), target);
                }
            }
        }
    }
}

#[test]
fn test_remainder_on_uneven_split() {
    let tasks = vec![task("a", 1, vec![2]), task("b", 2, vec![2])];
    let sv = compute_star_value(&tasks, date("2025-12-30"), 572);
    assert_eq!(sv.total_stars, 3);
    assert_eq!(sv.value_per_star, 190);
    assert_eq!(sv.full_payout(), 570);
    assert_eq!(sv.remainder(572), 2);
}
