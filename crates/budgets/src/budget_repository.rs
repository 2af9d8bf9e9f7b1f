use crate::models::{Budget, CreateBudgetRequest, CREATED_AT_FORMAT};
use chrono::NaiveDateTime;
use common::MonthYear;
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct BudgetRecord {
    id: i64,
    user_id: i64,
    budget_name: String,
    icon: String,
    target_amount: i64,
    created_at: String,
}

impl TryFrom<BudgetRecord> for Budget {
    type Error = RepositoryError;

    fn try_from(record: BudgetRecord) -> Result<Self, Self::Error> {
        let created_at = NaiveDateTime::parse_from_str(&record.created_at, CREATED_AT_FORMAT)
            .map_err(|e| RepositoryError::InvalidRecord(format!("budget {} created_at: {}", record.id, e)))?;

        Ok(Budget {
            id: record.id,
            user_id: record.user_id,
            budget_name: record.budget_name,
            icon: record.icon,
            target_amount: record.target_amount,
            created_at,
        })
    }
}

pub(crate) struct BudgetRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> BudgetRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &mut self,
        user_id: i64,
        req: &CreateBudgetRequest,
        created_at: NaiveDateTime,
    ) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO budgets (user_id, budget_name, icon, target_amount, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(user_id)
        .bind(req.budget_name())
        .bind(req.icon())
        .bind(req.target_amount())
        .bind(created_at.format(CREATED_AT_FORMAT).to_string())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn find_by_id(&mut self, user_id: i64, id: i64) -> Result<Option<Budget>, RepositoryError> {
        let record = sqlx::query_as::<_, BudgetRecord>(
            "SELECT id, user_id, budget_name, icon, target_amount, created_at FROM budgets WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Budget::try_from).transpose()
    }

    pub async fn list_for_month(&mut self, user_id: i64, month: MonthYear) -> Result<Vec<Budget>, RepositoryError> {
        let records = sqlx::query_as::<_, BudgetRecord>(
            "SELECT id, user_id, budget_name, icon, target_amount, created_at FROM budgets \
             WHERE user_id = $1 AND strftime('%Y-%m', created_at) = $2 ORDER BY budget_name",
        )
        .bind(user_id)
        .bind(month.key())
        .fetch_all(&mut *self.conn)
        .await?;

        records.into_iter().map(Budget::try_from).collect()
    }

    /// Sum of the month's budget targets, leaving out `excluding` if given.
    pub async fn total_for_month(
        &mut self,
        user_id: i64,
        month: MonthYear,
        excluding: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(target_amount), 0) FROM budgets \
             WHERE user_id = $1 AND strftime('%Y-%m', created_at) = $2 AND ($3 IS NULL OR id != $3)",
        )
        .bind(user_id)
        .bind(month.key())
        .bind(excluding)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(total)
    }

    pub async fn update(&mut self, user_id: i64, id: i64, req: &CreateBudgetRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE budgets SET budget_name = $1, icon = $2, target_amount = $3 WHERE id = $4 AND user_id = $5",
        )
        .bind(req.budget_name())
        .bind(req.icon())
        .bind(req.target_amount())
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn category_count(&mut self, budget_id: i64) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE budget_id = $1")
            .bind(budget_id)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }

    pub async fn delete(&mut self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
