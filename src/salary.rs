use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{LedgerError, Result};
use crate::models::UserProfile;

/// Result of checking the weekly salary rule.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryGrant {
    pub profile: UserProfile,
    pub granted: bool,
}

/// Credits the weekly base salary on a Monday not yet paid.
///
/// The only guard against a double grant is `last_salary_date`, so calling
/// this twice on the same Monday grants once. Missed Mondays are not backfilled.
pub fn maybe_grant(profile: &UserProfile, today: NaiveDate) -> Result<SalaryGrant> {
    if today.weekday() != Weekday::Mon || profile.last_salary_date == Some(today) {
        return Ok(SalaryGrant { profile: profile.clone(), granted: false });
    }

    let balance = profile
        .balance
        .checked_add(profile.weekly_base_salary)
        .ok_or(LedgerError::BalanceOverflow)?;

    Ok(SalaryGrant {
        profile: UserProfile {
            balance,
            last_salary_date: Some(today),
            ..profile.clone()
        },
        granted: true,
    })
}
