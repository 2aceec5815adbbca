//! Chore rewards for a household: daily tasks weighted by stars, a parent-confirmed
//! settlement that turns completed tasks into pocket money, and a weekly base salary
//! credited every Monday.

pub mod auth;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod salary;
pub mod settlement;
pub mod stars;
pub mod storage;
