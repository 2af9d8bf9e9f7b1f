use crate::models::{CreateExpenseRequest, Expense};
use common::MonthYear;
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct ExpenseRecord {
    id: i64,
    category_id: i64,
    title: String,
    amount: i64,
    expense_date: String,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = RepositoryError;

    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        let date = common::period::parse_date(&record.expense_date).map_err(RepositoryError::InvalidRecord)?;
        Ok(Expense {
            id: record.id,
            category_id: record.category_id,
            title: record.title,
            amount: record.amount,
            date,
        })
    }
}

// Expenses belong to a user through category -> budget.
const SELECT_EXPENSE: &str = "SELECT e.id, e.category_id, e.title, e.amount, e.expense_date \
     FROM expenses e JOIN categories c ON c.id = e.category_id JOIN budgets b ON b.id = c.budget_id \
     WHERE b.user_id = $1";

pub(crate) struct ExpenseRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> ExpenseRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, req: &CreateExpenseRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO expenses (category_id, title, amount, expense_date) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(req.category_id())
        .bind(req.title())
        .bind(req.amount())
        .bind(req.date().format("%Y-%m-%d").to_string())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn update(&mut self, id: i64, req: &CreateExpenseRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE expenses SET category_id = $1, title = $2, amount = $3, expense_date = $4 WHERE id = $5",
        )
        .bind(req.category_id())
        .bind(req.title())
        .bind(req.amount())
        .bind(req.date().format("%Y-%m-%d").to_string())
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, user_id: i64, id: i64) -> Result<Option<Expense>, RepositoryError> {
        let record = sqlx::query_as::<_, ExpenseRecord>(&format!("{} AND e.id = $2", SELECT_EXPENSE))
            .bind(user_id)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        record.map(Expense::try_from).transpose()
    }

    pub async fn list(
        &mut self,
        user_id: i64,
        month: Option<MonthYear>,
        category_id: Option<i64>,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let records = sqlx::query_as::<_, ExpenseRecord>(&format!(
            "{} AND ($2 IS NULL OR strftime('%Y-%m', e.expense_date) = $2) AND ($3 IS NULL OR e.category_id = $3) \
             ORDER BY e.expense_date DESC, e.id DESC",
            SELECT_EXPENSE
        ))
        .bind(user_id)
        .bind(month.map(|m| m.key()))
        .bind(category_id)
        .fetch_all(&mut *self.conn)
        .await?;

        records.into_iter().map(Expense::try_from).collect()
    }

    /// Sum of the user's expenses dated in `month`, leaving out `excluding`.
    pub async fn monthly_total(
        &mut self,
        user_id: i64,
        month: MonthYear,
        excluding: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(e.amount), 0) FROM expenses e \
             JOIN categories c ON c.id = e.category_id JOIN budgets b ON b.id = c.budget_id \
             WHERE b.user_id = $1 AND strftime('%Y-%m', e.expense_date) = $2 AND ($3 IS NULL OR e.id != $3)",
        )
        .bind(user_id)
        .bind(month.key())
        .bind(excluding)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(total)
    }

    /// Rewrites the stored category total from its expenses.
    pub async fn recompute_category_amount(&mut self, category_id: i64) -> Result<i64, RepositoryError> {
        let amount: i64 = sqlx::query_scalar(
            "UPDATE categories SET category_amount = (SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE category_id = $1) \
             WHERE id = $1 RETURNING category_amount",
        )
        .bind(category_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(amount)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
