use crate::budget_repository::BudgetRepository;
use crate::models::{Budget, BudgetSummary, CreateBudgetRequest, RawBudgetRequest};
use crate::repository::CategoryRepository;
use common::{Clock, MonthYear};
use database::{RepositoryError, Database};
use income::{IncomeError, IncomeService};
use rand::seq::SliceRandom;
use tracing::instrument;
use validation::{IncomeCeiling, MutationAttempt, Rejection, Subject, Verdict};

#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("Budget still has {0} categories")]
    HasCategories(i64),
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl From<RepositoryError> for BudgetError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => BudgetError::NotFound("Budget"),
            RepositoryError::CheckViolation(msg) => BudgetError::InvalidInput(msg),
            RepositoryError::Infrastructure(e) => BudgetError::Infrastructure(e.to_string()),
            _ => BudgetError::Infrastructure(err.to_string()),
        }
    }
}

impl From<IncomeError> for BudgetError {
    fn from(err: IncomeError) -> Self {
        match err {
            IncomeError::InvalidInput(msg) => BudgetError::InvalidInput(msg),
            other => BudgetError::Infrastructure(other.to_string()),
        }
    }
}

const ICONS: [&str; 16] = [
    "💰", "🛒", "🍔", "🏠", "🚗", "💡", "📱", "🎓",
    "🏥", "🎁", "✈️", "👕", "🎮", "🐾", "📚", "☕",
];

pub(crate) fn random_icon() -> String {
    let mut rng = rand::thread_rng();
    ICONS.choose(&mut rng).unwrap_or(&"💰").to_string()
}

pub(crate) fn icon_or_random(icon: Option<String>) -> String {
    icon.filter(|i| !i.trim().is_empty()).unwrap_or_else(random_icon)
}

pub struct BudgetService;

impl BudgetService {
    /// Month income minus the targets of budgets created that month.
    #[instrument(skip(db))]
    pub async fn remaining_budget_capacity(db: &Database, user_id: i64, month: MonthYear) -> Result<i64, BudgetError> {
        let income = IncomeService::total_income_for_month(db, user_id, month).await?;

        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());
        let committed = repo.total_for_month(user_id, month, None).await?;

        Ok(income - committed)
    }

    /// Income ceiling for budgets in `month`, plus what already counts
    /// against it (leaving out `excluding`).
    async fn budget_ceiling(
        db: &Database,
        user_id: i64,
        month: MonthYear,
        excluding: Option<i64>,
    ) -> Result<(IncomeCeiling, i64), BudgetError> {
        let income = IncomeService::has_income_for_month(db, user_id, month).await?;

        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());
        let committed = repo.total_for_month(user_id, month, excluding).await?;

        let ceiling = IncomeCeiling::new(Subject::Budget, month.key(), income.has_income, income.total_income);
        Ok((ceiling, committed))
    }

    /// `NO_INCOME` without income for the month, `EXCEEDS_INCOME` when the
    /// target is larger than the remaining capacity. Equal is accepted.
    #[instrument(skip(db))]
    pub async fn validate_budget_creation(
        db: &Database,
        user_id: i64,
        target_amount: i64,
        month: MonthYear,
    ) -> Result<Verdict, BudgetError> {
        let (ceiling, committed) = Self::budget_ceiling(db, user_id, month, None).await?;
        Ok(validation::evaluate(&ceiling, committed, target_amount, None)?)
    }

    /// Re-checks a target change against the budget's own month. The budget's
    /// current target is taken out before the new one is added back.
    #[instrument(skip(db))]
    pub async fn validate_budget_update(
        db: &Database,
        user_id: i64,
        budget_id: i64,
        new_target: i64,
    ) -> Result<Verdict, BudgetError> {
        let budget = Self::get_budget(db, user_id, budget_id).await?;
        if new_target <= budget.target_amount {
            return Ok(Verdict::default());
        }

        let month = MonthYear::from_date(budget.created_at.date());
        let (ceiling, committed) = Self::budget_ceiling(db, user_id, month, Some(budget_id)).await?;
        Ok(validation::evaluate(&ceiling, committed, new_target, None)?)
    }

    /// Creates a budget in the clock's current month together with its
    /// default category.
    #[instrument(skip(db, clock, raw))]
    pub async fn create_budget(
        db: &Database,
        clock: &dyn Clock,
        user_id: i64,
        raw: RawBudgetRequest,
    ) -> Result<i64, BudgetError> {
        let req = CreateBudgetRequest::new(raw.budget_name, icon_or_random(raw.icon), raw.target_amount)
            .map_err(BudgetError::InvalidInput)?;
        let now = clock.now();
        let month = MonthYear::from_date(now.date());

        let attempt = MutationAttempt::start("budget.create");
        let outcome = match Self::validate_budget_creation(db, user_id, req.target_amount(), month).await {
            Ok(verdict) => Ok(verdict),
            Err(BudgetError::Rejected(rejection)) => Err(rejection),
            Err(other) => return Err(other),
        };
        let persisting = attempt.decide(outcome)?.persist();

        let mut uow = db.begin().await?;
        let id = BudgetRepository::new(uow.connection()).create(user_id, &req, now).await?;
        CategoryRepository::new(uow.connection()).create(id, &req.default_category()).await?;
        uow.commit().await?;

        persisting.finish();
        tracing::info!(budget_id = id, target = req.target_amount(), %month, "budget created");
        Ok(id)
    }

    #[instrument(skip(db, raw))]
    pub async fn update_budget(
        db: &Database,
        user_id: i64,
        id: i64,
        raw: RawBudgetRequest,
    ) -> Result<Budget, BudgetError> {
        let existing = Self::get_budget(db, user_id, id).await?;
        let icon = raw.icon.filter(|i| !i.trim().is_empty()).unwrap_or(existing.icon);
        let req = CreateBudgetRequest::new(raw.budget_name, icon, raw.target_amount)
            .map_err(BudgetError::InvalidInput)?;

        let attempt = MutationAttempt::start("budget.update");
        let outcome = match Self::validate_budget_update(db, user_id, id, req.target_amount()).await {
            Ok(verdict) => Ok(verdict),
            Err(BudgetError::Rejected(rejection)) => Err(rejection),
            Err(other) => return Err(other),
        };
        let persisting = attempt.decide(outcome)?.persist();

        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());
        repo.update(user_id, id, &req).await?;
        let budget = repo.find_by_id(user_id, id).await?.ok_or(BudgetError::NotFound("Budget"))?;
        uow.commit().await?;

        persisting.finish();
        Ok(budget)
    }

    /// True only when no category refers to the budget.
    #[instrument(skip(db))]
    pub async fn can_delete_budget(db: &Database, user_id: i64, id: i64) -> Result<bool, BudgetError> {
        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());

        repo.find_by_id(user_id, id).await?.ok_or(BudgetError::NotFound("Budget"))?;
        Ok(repo.category_count(id).await? == 0)
    }

    #[instrument(skip(db))]
    pub async fn delete_budget(db: &Database, user_id: i64, id: i64) -> Result<(), BudgetError> {
        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());

        repo.find_by_id(user_id, id).await?.ok_or(BudgetError::NotFound("Budget"))?;
        let categories = repo.category_count(id).await?;
        if categories > 0 {
            tracing::info!(budget_id = id, categories, "budget delete refused");
            return Err(BudgetError::HasCategories(categories));
        }

        repo.delete(user_id, id).await?;
        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_budget(db: &Database, user_id: i64, id: i64) -> Result<Budget, BudgetError> {
        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());

        let budget = repo.find_by_id(user_id, id).await?.ok_or(BudgetError::NotFound("Budget"))?;
        Ok(budget)
    }

    #[instrument(skip(db))]
    pub async fn list_budgets(db: &Database, user_id: i64, month: MonthYear) -> Result<Vec<Budget>, BudgetError> {
        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());

        let budgets = repo.list_for_month(user_id, month).await?;
        Ok(budgets)
    }

    #[instrument(skip(db))]
    pub async fn budget_summary(db: &Database, user_id: i64, month: MonthYear) -> Result<BudgetSummary, BudgetError> {
        let income = IncomeService::total_income_for_month(db, user_id, month).await?;

        let mut uow = db.begin().await?;
        let mut repo = BudgetRepository::new(uow.connection());
        let monthly_budget_total = repo.total_for_month(user_id, month, None).await?;

        Ok(BudgetSummary {
            monthly_budget_total,
            remaining_budget: income - monthly_budget_total,
        })
    }
}
