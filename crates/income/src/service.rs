use crate::models::{CreateIncomeRequest, Income, MonthlyIncome, RawIncomeRequest};
use crate::recurrence::{self, occurrences_in_month};
use crate::repository::IncomeRepository;
use common::MonthYear;
use database::{RepositoryError, Database};
use tracing::instrument;
use validation::to_cents;

#[derive(Debug, thiserror::Error)]
pub enum IncomeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Income not found")]
    NotFound,
}

impl From<RepositoryError> for IncomeError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => IncomeError::NotFound,
            RepositoryError::CheckViolation(msg) => IncomeError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => IncomeError::Infrastructure(e.to_string()),
            _ => IncomeError::Infrastructure(err.to_string()),
        }
    }
}

pub struct IncomeService;

impl IncomeService {
    #[instrument(skip(db, raw))]
    pub async fn add_income(db: &Database, user_id: i64, raw: RawIncomeRequest) -> Result<i64, IncomeError> {
        let req = CreateIncomeRequest::from_raw(raw).map_err(IncomeError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let id = repo.create(user_id, &req).await?;

        uow.commit().await?;
        tracing::info!(income_id = id, amount = req.amount(), occurrence = req.occurrence().as_str(), "income recorded");
        Ok(id)
    }

    #[instrument(skip(db, raw))]
    pub async fn update_income(db: &Database, user_id: i64, id: i64, raw: RawIncomeRequest) -> Result<Income, IncomeError> {
        let req = CreateIncomeRequest::from_raw(raw).map_err(IncomeError::InvalidInput)?;

        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let existing = repo.find_by_id(user_id, id).await?.ok_or(IncomeError::NotFound)?;
        if existing.parent_income_id.is_some() && req.is_recurring() {
            return Err(IncomeError::InvalidInput(
                "A materialized occurrence cannot itself recur".into(),
            ));
        }

        // A recorded occurrence only stands in for its parent on the same
        // date, so neither side's schedule may move while they are linked.
        let reschedules = req.date() != existing.date || req.occurrence() != existing.occurrence;
        if reschedules {
            if existing.parent_income_id.is_some() {
                return Err(IncomeError::Conflict(
                    "The date of a recorded occurrence cannot change".into(),
                ));
            }
            if !repo.list_children(user_id, id).await?.is_empty() {
                return Err(IncomeError::Conflict(
                    "Income has recorded occurrences. Delete them before changing its schedule".into(),
                ));
            }
        }

        repo.update(user_id, id, &req).await?;
        let income = repo.find_by_id(user_id, id).await?.ok_or(IncomeError::NotFound)?;

        uow.commit().await?;
        Ok(income)
    }

    /// Removes one income, or with `delete_all_recurrences` its whole series
    /// (the root row plus every materialized occurrence). Returns rows removed.
    #[instrument(skip(db))]
    pub async fn delete_income(
        db: &Database,
        user_id: i64,
        id: i64,
        delete_all_recurrences: bool,
    ) -> Result<u64, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let removed = if delete_all_recurrences {
            let income = repo.find_by_id(user_id, id).await?.ok_or(IncomeError::NotFound)?;
            let root = income.parent_income_id.unwrap_or(income.id);
            repo.delete_series(user_id, root).await?
        } else {
            repo.delete(user_id, id).await?
        };

        uow.commit().await?;
        tracing::info!(income_id = id, removed, "income deleted");
        Ok(removed)
    }

    #[instrument(skip(db))]
    pub async fn get_income(db: &Database, user_id: i64, id: i64) -> Result<Income, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let income = repo.find_by_id(user_id, id).await?.ok_or(IncomeError::NotFound)?;
        Ok(income)
    }

    /// All incomes, or with `month` only those paying out in it.
    #[instrument(skip(db))]
    pub async fn list_incomes(db: &Database, user_id: i64, month: Option<MonthYear>) -> Result<Vec<Income>, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let incomes = match month {
            Some(month) => repo
                .list_for_month(user_id, month)
                .await?
                .into_iter()
                .filter(|i| !recurrence::income_dates_in_month(i, month).is_empty())
                .collect(),
            None => repo.list(user_id).await?,
        };
        Ok(incomes)
    }

    /// Materializes one occurrence of a recurring income as its own row, so
    /// it can carry a different amount for that date.
    #[instrument(skip(db))]
    pub async fn record_occurrence(
        db: &Database,
        user_id: i64,
        parent_id: i64,
        date: &str,
        amount: Option<f64>,
    ) -> Result<i64, IncomeError> {
        let date = common::period::parse_date(date).map_err(IncomeError::InvalidInput)?;
        let amount = amount.map(to_cents).transpose().map_err(IncomeError::InvalidInput)?;
        if amount.is_some_and(|a| a <= 0) {
            return Err(IncomeError::InvalidInput("Income amount must be greater than zero".into()));
        }

        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let parent = repo.find_by_id(user_id, parent_id).await?.ok_or(IncomeError::NotFound)?;
        if !parent.is_recurring || parent.parent_income_id.is_some() {
            return Err(IncomeError::InvalidInput("Income is not recurring".into()));
        }
        if !occurrences_in_month(parent.date, parent.occurrence, MonthYear::from_date(date)).contains(&date) {
            return Err(IncomeError::InvalidInput(format!(
                "{} is not an occurrence of this income",
                date
            )));
        }
        if repo.list_children(user_id, parent_id).await?.iter().any(|c| c.date == date) {
            return Err(IncomeError::Conflict(format!("Occurrence on {} already recorded", date)));
        }

        let id = repo.create(user_id, &CreateIncomeRequest::occurrence_of(&parent, date, amount)).await?;

        uow.commit().await?;
        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn has_income_for_month(db: &Database, user_id: i64, month: MonthYear) -> Result<MonthlyIncome, IncomeError> {
        let mut uow = db.begin().await?;
        let mut repo = IncomeRepository::new(uow.connection());

        let rows = repo.list_for_month(user_id, month).await?;
        let result = recurrence::monthly_income(&rows, month);
        tracing::debug!(%month, has_income = result.has_income, total = result.total_income, "monthly income");
        Ok(result)
    }

    pub async fn total_income_for_month(db: &Database, user_id: i64, month: MonthYear) -> Result<i64, IncomeError> {
        Ok(Self::has_income_for_month(db, user_id, month).await?.total_income)
    }
}
