//! Budget registry and category store.
//!
//! A budget is a monthly spending target; the month's budget targets may not
//! add up to more than that month's income. Categories sit under a budget and
//! carry the running total of their expenses.

mod budget_repository;
pub mod category_service;
pub mod handler;
pub mod models;
mod repository;
pub mod service;

pub use category_service::CategoryService;
pub use models::{Budget, BudgetSummary, Category};
pub use service::{BudgetError, BudgetService};
