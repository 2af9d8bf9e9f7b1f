use budgets::models::CategoryView;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validation::{to_amount, to_cents, BudgetWarning};
use validator::Validate;

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub amount: i64, // Cents
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView {
    #[serde(rename = "expenseID")]
    pub expense_id: i64,
    #[serde(rename = "categoryID")]
    pub category_id: i64,
    pub title: String,
    pub amount: f64,
    pub date: String,
}

impl From<Expense> for ExpenseView {
    fn from(expense: Expense) -> Self {
        ExpenseView {
            expense_id: expense.id,
            category_id: expense.category_id,
            title: expense.title,
            amount: to_amount(expense.amount),
            date: expense.date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Response to an accepted write: the stored expense, its category as
/// recomputed afterwards, and the advisory warning if one applies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReceipt {
    pub expense: ExpenseView,
    pub category: CategoryView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<BudgetWarning>,
}

#[derive(Debug, Clone)]
pub struct CreateExpenseRequest {
    category_id: i64,
    title: String,
    amount: i64,
    date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawExpenseRequest {
    #[serde(rename = "categoryID", alias = "categoryId")]
    pub category_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0))]
    pub amount: f64,
    pub date: String,
}

impl CreateExpenseRequest {
    pub fn new(category_id: i64, title: String, amount: f64, date: &str) -> Result<Self, String> {
        if title.trim().is_empty() {
            return Err("Expense title cannot be empty".to_string());
        }
        let amount = to_cents(amount)?;
        if amount <= 0 {
            return Err("Expense amount must be greater than zero".to_string());
        }
        let date = common::period::parse_date(date)?;

        Ok(Self {
            category_id,
            title: title.trim().to_string(),
            amount,
            date,
        })
    }

    pub fn from_raw(raw: RawExpenseRequest) -> Result<Self, String> {
        Self::new(raw.category_id, raw.title, raw.amount, &raw.date)
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// A proposed new expense, checked without being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedExpense {
    pub category_id: i64,
    pub amount: i64,
    pub date: NaiveDate,
}

/// A proposed change to a stored expense. Unset fields keep their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedEdit {
    pub expense_id: i64,
    pub new_amount: i64,
    pub new_date: Option<NaiveDate>,
    pub new_category_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAdditionRequest {
    #[serde(rename = "categoryID", alias = "categoryId")]
    pub category_id: i64,
    #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0))]
    pub amount: f64,
    pub date: String,
}

impl ValidateAdditionRequest {
    pub fn proposal(&self) -> Result<ProposedExpense, String> {
        Ok(ProposedExpense {
            category_id: self.category_id,
            amount: to_cents(self.amount)?,
            date: common::period::parse_date(&self.date)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateEditRequest {
    #[serde(rename = "expenseID", alias = "expenseId")]
    pub expense_id: i64,
    #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0))]
    pub new_amount: f64,
    pub new_date: Option<String>,
    #[serde(rename = "newCategoryID", alias = "newCategoryId")]
    pub new_category_id: Option<i64>,
}

impl ValidateEditRequest {
    pub fn proposal(&self) -> Result<ProposedEdit, String> {
        let new_date = match &self.new_date {
            Some(date) => Some(common::period::parse_date(date)?),
            None => None,
        };
        Ok(ProposedEdit {
            expense_id: self.expense_id,
            new_amount: to_cents(self.new_amount)?,
            new_date,
            new_category_id: self.new_category_id,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyExpenseSummary {
    pub monthly_expense_total: i64,
    pub remaining_income: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpenseSummaryView {
    pub monthly_expense_total: f64,
    pub remaining_income: f64,
}

impl From<MonthlyExpenseSummary> for MonthlyExpenseSummaryView {
    fn from(summary: MonthlyExpenseSummary) -> Self {
        MonthlyExpenseSummaryView {
            monthly_expense_total: to_amount(summary.monthly_expense_total),
            remaining_income: to_amount(summary.remaining_income),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_expense_request() {
        let req = CreateExpenseRequest::new(4, " Lunch ".into(), 12.5, "2026-03-02").unwrap();
        assert_eq!(req.title(), "Lunch");
        assert_eq!(req.amount(), 1250);
        assert_eq!(req.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_create_expense_request_invalid() {
        assert!(CreateExpenseRequest::new(4, "".into(), 12.5, "2026-03-02").is_err());
        assert!(CreateExpenseRequest::new(4, "Lunch".into(), 0.0, "2026-03-02").is_err());
        assert!(CreateExpenseRequest::new(4, "Lunch".into(), 12.5, "02/03/2026").is_err());
        assert!(CreateExpenseRequest::new(4, "Lunch".into(), 1e20, "2026-03-02").is_err());
    }

    #[test]
    fn test_edit_request_accepts_both_id_spellings() {
        let req: ValidateEditRequest =
            serde_json::from_value(serde_json::json!({ "expenseId": 7, "newAmount": 20 })).unwrap();
        let proposal = req.proposal().unwrap();
        assert_eq!(proposal.expense_id, 7);
        assert_eq!(proposal.new_amount, 20_00);
        assert_eq!(proposal.new_date, None);

        let req: ValidateEditRequest = serde_json::from_value(serde_json::json!({
            "expenseID": 7, "newAmount": 20, "newDate": "2026-04-01", "newCategoryID": 3
        }))
        .unwrap();
        assert_eq!(req.proposal().unwrap().new_category_id, Some(3));
    }
}
