//! Read-modify-write orchestration around the pure settlement and salary rules.
//!
//! Profiles are written with an optimistic version check. On a conflict the
//! profile is re-read and the change recomputed, up to `max_retries` times.

use chrono::NaiveDate;
use log::{debug, error, info, warn};

use crate::auth::{hash_parent_password, verify_parent, MIN_PARENT_PASSWORD_LEN};
use crate::clock::Clock;
use crate::config::DailyTarget;
use crate::error::{AuthError, LedgerError, Result, StoreError};
use crate::models::{default_tasks, CompletionMap, Task, UserProfile};
use crate::salary::{maybe_grant, SalaryGrant};
use crate::settlement::{settle, Settlement};
use crate::stars::compute_star_value;
use crate::storage::{LogFilter, Store};

/// Snapshot of a user's day for the dashboard.
#[derive(Debug, Clone)]
pub struct DaySummary {
    pub profile: UserProfile,
    pub date: NaiveDate,
    pub target: u64,
    pub active_tasks: Vec<Task>,
    pub total_stars: u64,
    pub value_per_star: u64,
    /// Lost to floor division when every task is done.
    pub remainder: u64,
    pub settled: bool,
}

pub struct Ledger<'a> {
    store: &'a dyn Store,
    clock: &'a dyn Clock,
    target: DailyTarget,
    max_retries: u32,
}

impl<'a> Ledger<'a> {
    pub fn new(store: &'a dyn Store, clock: &'a dyn Clock, target: DailyTarget, max_retries: u32) -> Ledger<'a> {
        Ledger { store, clock, target, max_retries: max_retries.max(1) }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Creates the profile and default tasks for a new user.
    ///
    /// Returns false when the user already had a profile.
    pub fn init_user(&self, user_id: &str, weekly_base_salary: u64) -> Result<bool> {
        match self.store.get_profile(user_id) {
            Ok(_) => return Ok(false),
            Err(StoreError::ProfileNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        self.store.put_profile(&UserProfile::new(user_id, weekly_base_salary))?;
        if self.store.list_tasks(user_id)?.is_empty() {
            self.store.save_tasks(user_id, &default_tasks())?;
        }
        info!("initialised user {}", user_id);
        Ok(true)
    }

    /// Applies `change` to the stored profile, retrying on version conflicts.
    ///
    /// `change` returns `None` when there is nothing to write.
    fn update_profile<F>(&self, user_id: &str, mut change: F) -> Result<Option<UserProfile>>
    where
        F: FnMut(&UserProfile) -> Result<Option<UserProfile>>,
    {
        for attempt in 1..=self.max_retries {
            let current = self.store.get_profile(user_id)?;
            let Some(updated) = change(&current)? else {
                return Ok(None);
            };
            match self.store.put_profile(&updated) {
                Ok(stored) => return Ok(Some(stored)),
                Err(StoreError::VersionConflict { expected, found, .. }) => {
                    warn!("profile {} conflict on attempt {} (v{} vs v{})", user_id, attempt, expected, found);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(LedgerError::ConflictRetriesExhausted(self.max_retries))
    }

    /// Grants the weekly base salary if today is an unpaid Monday.
    pub fn open_day(&self, user_id: &str) -> Result<SalaryGrant> {
        let today = self.today();
        let stored = self.update_profile(user_id, |profile| {
            let grant = maybe_grant(profile, today)?;
            Ok(grant.granted.then_some(grant.profile))
        })?;
        match stored {
            Some(profile) => {
                info!("weekly salary of {} granted to {}", profile.weekly_base_salary, user_id);
                Ok(SalaryGrant { profile, granted: true })
            }
            None => Ok(SalaryGrant { profile: self.store.get_profile(user_id)?, granted: false }),
        }
    }

    pub fn has_settled(&self, user_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(!self.store.list_logs(user_id, &LogFilter::on(date))?.is_empty())
    }

    /// Computes today's settlement without storing anything.
    pub fn preview(&self, user_id: &str, completion: &CompletionMap) -> Result<Settlement> {
        Ok(self.compute(user_id, completion)?.1)
    }

    fn compute(&self, user_id: &str, completion: &CompletionMap) -> Result<(UserProfile, Settlement)> {
        let profile = self.store.get_profile(user_id)?;
        let tasks = self.store.list_tasks(user_id)?;
        let settlement = settle(&profile, &tasks, completion, self.today(), self.target.resolve(&profile))?;
        Ok((profile, settlement))
    }

    /// Settles today, appends the log and credits the reward.
    ///
    /// Fails with [`LedgerError::AlreadySettled`] when today has a log, and
    /// with [`LedgerError::NoTasksScheduled`] for an empty day unless
    /// `allow_empty` is set. If the balance cannot be written the log is
    /// removed again, so the day can be settled later.
    pub fn settle_today(&self, user_id: &str, completion: &CompletionMap, allow_empty: bool) -> Result<Settlement> {
        let today = self.today();
        if self.has_settled(user_id, today)? {
            return Err(LedgerError::AlreadySettled(today));
        }

        let (profile, settlement) = self.compute(user_id, completion)?;
        if settlement.is_empty() && !allow_empty {
            return Err(LedgerError::NoTasksScheduled(today));
        }

        self.store.append_log(user_id, &settlement.log).map_err(|e| match e {
            StoreError::DuplicateLog { date, .. } => LedgerError::AlreadySettled(date),
            e => e.into(),
        })?;

        let reward = settlement.total_reward();
        // The profile read above is the first candidate; re-read only on conflict.
        let credited = match self.store.put_profile(&settlement.apply_to(&profile)) {
            Ok(stored) => Ok(Some(stored)),
            Err(StoreError::VersionConflict { .. }) => {
                debug!("profile {} moved since v{}, re-reading", user_id, settlement.profile_version);
                self.update_profile(user_id, |current| {
                    let balance = current.balance.checked_add(reward).ok_or(LedgerError::BalanceOverflow)?;
                    Ok(Some(UserProfile { balance, ..current.clone() }))
                })
            }
            Err(e) => Err(e.into()),
        };
        let stored = match credited {
            Ok(stored) => stored,
            Err(e) => {
                warn!("crediting {} for {} failed, withdrawing the log: {}", today, user_id, e);
                if let Err(undo) = self.store.remove_log(user_id, today) {
                    error!("could not remove the log of {} for {}: {}", today, user_id, undo);
                }
                return Err(e);
            }
        };
        let new_balance = stored.map_or(settlement.new_balance, |p| p.balance);
        debug!("settled {} for {}: +{} -> {}", today, user_id, reward, new_balance);

        Ok(Settlement { new_balance, ..settlement })
    }

    pub fn summary(&self, user_id: &str) -> Result<DaySummary> {
        let profile = self.store.get_profile(user_id)?;
        let tasks = self.store.list_tasks(user_id)?;
        let date = self.today();
        let target = self.target.resolve(&profile);
        let star_value = compute_star_value(&tasks, date, target);
        Ok(DaySummary {
            remainder: star_value.remainder(target),
            active_tasks: star_value.active_tasks.iter().map(|t| (*t).clone()).collect(),
            total_stars: star_value.total_stars,
            value_per_star: star_value.value_per_star,
            settled: self.has_settled(user_id, date)?,
            target,
            date,
            profile,
        })
    }

    /// Changes the weekly base salary.
    pub fn set_weekly_salary(&self, user_id: &str, amount: u64) -> Result<UserProfile> {
        let stored = self.update_profile(user_id, |profile| {
            Ok(Some(UserProfile { weekly_base_salary: amount, ..profile.clone() }))
        })?;
        match stored {
            Some(p) => Ok(p),
            None => Ok(self.store.get_profile(user_id)?),
        }
    }

    /// Fails unless `password` opens the user's parent gate.
    pub fn authorize_parent(&self, user_id: &str, password: Option<&str>) -> Result<()> {
        let profile = self.store.get_profile(user_id)?;
        verify_parent(&profile, password)?;
        Ok(())
    }

    /// Sets or replaces the parent password. Replacing needs the current one.
    pub fn set_parent_password(&self, user_id: &str, current: Option<&str>, new: &str) -> Result<UserProfile> {
        if new.chars().count() < MIN_PARENT_PASSWORD_LEN {
            return Err(AuthError::WeakParentPassword(MIN_PARENT_PASSWORD_LEN).into());
        }
        let hash = hash_parent_password(user_id, new);
        let stored = self.update_profile(user_id, |profile| {
            verify_parent(profile, current)?;
            Ok(Some(UserProfile { parent_password_hash: Some(hash.clone()), ..profile.clone() }))
        })?;
        info!("parent password updated for {}", user_id);
        match stored {
            Some(p) => Ok(p),
            None => Ok(self.store.get_profile(user_id)?),
        }
    }
}
