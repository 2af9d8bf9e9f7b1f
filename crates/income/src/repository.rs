use crate::models::{CreateIncomeRequest, Income};
use common::MonthYear;
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct IncomeRecord {
    id: i64,
    user_id: i64,
    income_type: String,
    source: String,
    title: String,
    amount: i64,
    income_date: String,
    occurrence: String,
    is_recurring: bool,
    parent_income_id: Option<i64>,
}

impl TryFrom<IncomeRecord> for Income {
    type Error = RepositoryError;

    fn try_from(record: IncomeRecord) -> Result<Self, Self::Error> {
        Ok(Income {
            id: record.id,
            user_id: record.user_id,
            income_type: record.income_type.parse().map_err(RepositoryError::InvalidRecord)?,
            source: record.source,
            title: record.title,
            amount: record.amount,
            date: common::period::parse_date(&record.income_date).map_err(RepositoryError::InvalidRecord)?,
            occurrence: record.occurrence.parse().map_err(RepositoryError::InvalidRecord)?,
            is_recurring: record.is_recurring,
            parent_income_id: record.parent_income_id,
        })
    }
}

const COLUMNS: &str = "id, user_id, income_type, source, title, amount, income_date, occurrence, is_recurring, parent_income_id";

fn collect(records: Vec<IncomeRecord>) -> Result<Vec<Income>, RepositoryError> {
    records.into_iter().map(Income::try_from).collect()
}

pub(crate) struct IncomeRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> IncomeRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, user_id: i64, req: &CreateIncomeRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO incomes (user_id, income_type, source, title, amount, income_date, occurrence, is_recurring, parent_income_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
        )
        .bind(user_id)
        .bind(req.income_type().as_str())
        .bind(req.source())
        .bind(req.title())
        .bind(req.amount())
        .bind(req.date().format("%Y-%m-%d").to_string())
        .bind(req.occurrence().as_str())
        .bind(req.is_recurring())
        .bind(req.parent_income_id())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn find_by_id(&mut self, user_id: i64, id: i64) -> Result<Option<Income>, RepositoryError> {
        let record = sqlx::query_as::<_, IncomeRecord>(&format!(
            "SELECT {} FROM incomes WHERE id = $1 AND user_id = $2",
            COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Income::try_from).transpose()
    }

    pub async fn list(&mut self, user_id: i64) -> Result<Vec<Income>, RepositoryError> {
        let records = sqlx::query_as::<_, IncomeRecord>(&format!(
            "SELECT {} FROM incomes WHERE user_id = $1 ORDER BY income_date DESC, id DESC",
            COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        collect(records)
    }

    /// Rows that can contribute to `month`: anything dated in it, plus
    /// recurring parents that started on or before its last day.
    pub async fn list_for_month(&mut self, user_id: i64, month: MonthYear) -> Result<Vec<Income>, RepositoryError> {
        let first = month.first_day().format("%Y-%m-%d").to_string();
        let last = month.last_day().format("%Y-%m-%d").to_string();

        let records = sqlx::query_as::<_, IncomeRecord>(&format!(
            "SELECT {} FROM incomes WHERE user_id = $1 AND ( \
                 (is_recurring = 1 AND parent_income_id IS NULL AND income_date <= $3) \
                 OR income_date BETWEEN $2 AND $3 \
             ) ORDER BY income_date, id",
            COLUMNS
        ))
        .bind(user_id)
        .bind(first)
        .bind(last)
        .fetch_all(&mut *self.conn)
        .await?;

        collect(records)
    }

    pub async fn list_children(&mut self, user_id: i64, parent_id: i64) -> Result<Vec<Income>, RepositoryError> {
        let records = sqlx::query_as::<_, IncomeRecord>(&format!(
            "SELECT {} FROM incomes WHERE user_id = $1 AND parent_income_id = $2 ORDER BY income_date",
            COLUMNS
        ))
        .bind(user_id)
        .bind(parent_id)
        .fetch_all(&mut *self.conn)
        .await?;

        collect(records)
    }

    pub async fn update(&mut self, user_id: i64, id: i64, req: &CreateIncomeRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE incomes SET income_type = $1, source = $2, title = $3, amount = $4, income_date = $5, occurrence = $6, is_recurring = $7 \
             WHERE id = $8 AND user_id = $9",
        )
        .bind(req.income_type().as_str())
        .bind(req.source())
        .bind(req.title())
        .bind(req.amount())
        .bind(req.date().format("%Y-%m-%d").to_string())
        .bind(req.occurrence().as_str())
        .bind(req.is_recurring())
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Deletes one row. Its materialized children stay as one-off records.
    pub async fn delete(&mut self, user_id: i64, id: i64) -> Result<u64, RepositoryError> {
        sqlx::query("UPDATE incomes SET parent_income_id = NULL WHERE parent_income_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        let result = sqlx::query("DELETE FROM incomes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(result.rows_affected())
    }

    /// Deletes the series rooted at `root_id` and every materialized child.
    pub async fn delete_series(&mut self, user_id: i64, root_id: i64) -> Result<u64, RepositoryError> {
        let children = sqlx::query("DELETE FROM incomes WHERE user_id = $1 AND parent_income_id = $2")
            .bind(user_id)
            .bind(root_id)
            .execute(&mut *self.conn)
            .await?;

        let root = sqlx::query("DELETE FROM incomes WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(root_id)
            .execute(&mut *self.conn)
            .await?;

        if root.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(root.rows_affected() + children.rows_affected())
    }
}
