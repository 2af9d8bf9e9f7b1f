//! Expense ledger and the validation service guarding it.
//!
//! Every expense write is checked against the month's income first. A write
//! that passes may still carry a category warning; one that fails leaves the
//! store untouched.

pub mod handler;
pub mod models;
mod repository;
pub mod service;

pub use models::{Expense, MonthlyExpenseSummary};
pub use service::{ExpenseError, ExpenseService};
