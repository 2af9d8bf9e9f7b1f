use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validation::{to_amount, to_cents};
use validator::Validate;

pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub budget_name: String,
    pub icon: String,
    pub target_amount: i64, // Cents
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetView {
    #[serde(rename = "budgetID")]
    pub budget_id: i64,
    #[serde(rename = "userID")]
    pub user_id: i64,
    pub budget_name: String,
    pub icon: String,
    pub target_amount: f64,
    pub created_at: String,
}

impl From<Budget> for BudgetView {
    fn from(budget: Budget) -> Self {
        BudgetView {
            budget_id: budget.id,
            user_id: budget.user_id,
            budget_name: budget.budget_name,
            icon: budget.icon,
            target_amount: to_amount(budget.target_amount),
            created_at: budget.created_at.format(CREATED_AT_FORMAT).to_string(),
        }
    }
}

/// A category with the target of the budget it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub budget_id: i64,
    pub category_name: String,
    pub icon: String,
    pub category_amount: i64, // Cents, sum of expenses
    pub target_amount: i64,   // Cents, from the parent budget
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    #[serde(rename = "categoryID")]
    pub category_id: i64,
    #[serde(rename = "budgetID")]
    pub budget_id: i64,
    pub category_name: String,
    pub icon: String,
    pub category_amount: f64,
    pub target_amount: f64,
}

impl From<Category> for CategoryView {
    fn from(category: Category) -> Self {
        CategoryView {
            category_id: category.id,
            budget_id: category.budget_id,
            category_name: category.category_name,
            icon: category.icon,
            category_amount: to_amount(category.category_amount),
            target_amount: to_amount(category.target_amount),
        }
    }
}

/// Shape returned by `GET /budget/categories/{id}`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotalsView {
    pub category_amount: f64,
    pub target_amount: f64,
}

impl From<&Category> for CategoryTotalsView {
    fn from(category: &Category) -> Self {
        CategoryTotalsView {
            category_amount: to_amount(category.category_amount),
            target_amount: to_amount(category.target_amount),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBudgetRequest {
    budget_name: String,
    icon: String,
    target_amount: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawBudgetRequest {
    #[validate(length(min = 1, max = 50))]
    pub budget_name: String,
    pub icon: Option<String>,
    #[validate(range(min = 0.0, max = 1_000_000_000_000.0))]
    pub target_amount: f64,
}

impl CreateBudgetRequest {
    pub fn new(budget_name: String, icon: String, target_amount: f64) -> Result<Self, String> {
        if budget_name.trim().is_empty() {
            return Err("Budget name cannot be empty".to_string());
        }
        if target_amount < 0.0 {
            return Err("Target amount cannot be negative".to_string());
        }

        Ok(Self {
            budget_name: budget_name.trim().to_string(),
            icon,
            target_amount: to_cents(target_amount)?,
        })
    }

    pub fn budget_name(&self) -> &str {
        &self.budget_name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn target_amount(&self) -> i64 {
        self.target_amount
    }

    /// The category every new budget starts with.
    pub fn default_category(&self) -> CreateCategoryRequest {
        CreateCategoryRequest {
            category_name: self.budget_name.clone(),
            icon: self.icon.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryRequest {
    category_name: String,
    icon: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawCategoryRequest {
    #[validate(length(min = 1, max = 50))]
    pub category_name: String,
    pub icon: Option<String>,
}

impl CreateCategoryRequest {
    pub fn new(category_name: String, icon: String) -> Result<Self, String> {
        if category_name.trim().is_empty() {
            return Err("Category name cannot be empty".to_string());
        }

        Ok(Self {
            category_name: category_name.trim().to_string(),
            icon,
        })
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateBudgetRequest {
    #[validate(range(min = 0.0, max = 1_000_000_000_000.0))]
    pub target_amount: f64,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSummary {
    pub monthly_budget_total: i64,
    pub remaining_budget: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummaryView {
    pub monthly_budget_total: f64,
    pub remaining_budget: f64,
}

impl From<BudgetSummary> for BudgetSummaryView {
    fn from(summary: BudgetSummary) -> Self {
        BudgetSummaryView {
            monthly_budget_total: to_amount(summary.monthly_budget_total),
            remaining_budget: to_amount(summary.remaining_budget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_budget_request_valid() {
        let req = CreateBudgetRequest::new(" Groceries ".into(), "🛒".into(), 500.0).unwrap();
        assert_eq!(req.budget_name(), "Groceries");
        assert_eq!(req.target_amount(), 50000);

        let category = req.default_category();
        assert_eq!(category.category_name(), "Groceries");
        assert_eq!(category.icon(), "🛒");
    }

    #[test]
    fn test_create_budget_request_invalid() {
        assert!(CreateBudgetRequest::new("   ".into(), "🛒".into(), 10.0).is_err());
        assert!(CreateBudgetRequest::new("Food".into(), "🛒".into(), -1.0).is_err());
    }

    #[test]
    fn test_create_category_request_empty() {
        assert!(CreateCategoryRequest::new("   ".to_string(), "🍔".to_string()).is_err());
    }

    #[test]
    fn test_category_totals_wire_names() {
        let category = Category {
            id: 3,
            budget_id: 1,
            category_name: "Food".into(),
            icon: "🍔".into(),
            category_amount: 350_00,
            target_amount: 500_00,
        };
        let value = serde_json::to_value(CategoryTotalsView::from(&category)).unwrap();
        assert_eq!(value, serde_json::json!({ "categoryAmount": 350.0, "targetAmount": 500.0 }));
    }
}
