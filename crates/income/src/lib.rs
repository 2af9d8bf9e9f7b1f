//! Income ledger: income records per user and the monthly income figures
//! budgets and expenses are checked against.

pub mod handler;
pub mod models;
pub mod recurrence;
mod repository;
pub mod service;

pub use models::{Income, IncomeType, MonthlyIncome, Occurrence};
pub use service::{IncomeError, IncomeService};
