use crate::models::{CreateExpenseRequest, Expense, MonthlyExpenseSummary, ProposedEdit, ProposedExpense, RawExpenseRequest};
use crate::repository::ExpenseRepository;
use budgets::{BudgetError, Category, CategoryService};
use chrono::NaiveDate;
use common::MonthYear;
use database::{RepositoryError, Database};
use income::{IncomeError, IncomeService};
use tracing::instrument;
use validation::{CategoryThreshold, IncomeCeiling, MutationAttempt, Rejection, Subject, Verdict};

#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl From<RepositoryError> for ExpenseError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ExpenseError::NotFound("Expense"),
            RepositoryError::CheckViolation(msg) => ExpenseError::InvalidInput(msg),
            RepositoryError::ForeignKeyViolation(_) => ExpenseError::NotFound("Category"),
            RepositoryError::Infrastructure(e) => ExpenseError::Infrastructure(e.to_string()),
            _ => ExpenseError::Infrastructure(err.to_string()),
        }
    }
}

impl From<IncomeError> for ExpenseError {
    fn from(err: IncomeError) -> Self {
        match err {
            IncomeError::InvalidInput(msg) => ExpenseError::InvalidInput(msg),
            other => ExpenseError::Infrastructure(other.to_string()),
        }
    }
}

impl From<BudgetError> for ExpenseError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::NotFound(what) => ExpenseError::NotFound(what),
            BudgetError::InvalidInput(msg) => ExpenseError::InvalidInput(msg),
            BudgetError::Rejected(rejection) => ExpenseError::Rejected(rejection),
            other => ExpenseError::Infrastructure(other.to_string()),
        }
    }
}

/// What an accepted write leaves behind, re-read after commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseWrite {
    pub expense: Expense,
    pub category: Category,
    pub verdict: Verdict,
}

pub struct ExpenseService;

impl ExpenseService {
    /// Both rule stages for putting `amount` into `category` on `date`.
    /// `replacing` is the stored expense an edit would overwrite; its amount
    /// is taken out of the month and category totals first.
    async fn check(
        db: &Database,
        user_id: i64,
        category: &Category,
        date: NaiveDate,
        amount: i64,
        replacing: Option<&Expense>,
    ) -> Result<Verdict, ExpenseError> {
        let month = MonthYear::from_date(date);
        let income = IncomeService::has_income_for_month(db, user_id, month).await?;

        let committed = {
            let mut uow = db.begin().await?;
            ExpenseRepository::new(uow.connection())
                .monthly_total(user_id, month, replacing.map(|e| e.id))
                .await?
        };

        let category_base = match replacing {
            Some(old) if old.category_id == category.id => category.category_amount - old.amount,
            _ => category.category_amount,
        };

        let category_total = category_base
            .checked_add(amount)
            .ok_or_else(|| ExpenseError::InvalidInput("Expense amount is too large".into()))?;

        let ceiling = IncomeCeiling::new(Subject::Expense, month.key(), income.has_income, income.total_income);
        ceiling.check(committed, amount)?;

        let percentage = CategoryService::compute_budget_percentage(db, user_id, category.id, category_total).await?;
        let threshold = CategoryThreshold::new(category.category_name.clone(), category.target_amount);
        let verdict = Verdict { warning: threshold.classify(percentage, category_total) };

        if let Some(warning) = &verdict.warning {
            tracing::info!(category_id = category.id, level = ?warning.level, "category budget warning");
        }
        Ok(verdict)
    }

    #[instrument(skip(db))]
    pub async fn validate_expense_addition(
        db: &Database,
        user_id: i64,
        proposal: ProposedExpense,
    ) -> Result<Verdict, ExpenseError> {
        let category = CategoryService::get_category(db, user_id, proposal.category_id).await?;
        Self::check(db, user_id, &category, proposal.date, proposal.amount, None).await
    }

    /// Same rules as an addition, with the stored expense removed first so it
    /// is never counted twice.
    #[instrument(skip(db))]
    pub async fn validate_expense_edit(db: &Database, user_id: i64, edit: ProposedEdit) -> Result<Verdict, ExpenseError> {
        let existing = Self::get_expense(db, user_id, edit.expense_id).await?;
        let category_id = edit.new_category_id.unwrap_or(existing.category_id);
        let date = edit.new_date.unwrap_or(existing.date);

        let category = CategoryService::get_category(db, user_id, category_id).await?;
        Self::check(db, user_id, &category, date, edit.new_amount, Some(&existing)).await
    }

    #[instrument(skip(db, raw))]
    pub async fn create_expense(db: &Database, user_id: i64, raw: RawExpenseRequest) -> Result<ExpenseWrite, ExpenseError> {
        let req = CreateExpenseRequest::from_raw(raw).map_err(ExpenseError::InvalidInput)?;
        let category = CategoryService::get_category(db, user_id, req.category_id()).await?;

        let attempt = MutationAttempt::start("expense.create");
        let outcome = match Self::check(db, user_id, &category, req.date(), req.amount(), None).await {
            Ok(verdict) => Ok(verdict),
            Err(ExpenseError::Rejected(rejection)) => Err(rejection),
            Err(other) => return Err(other),
        };
        let persisting = attempt.decide(outcome)?.persist();

        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());
        let id = repo.create(&req).await?;
        repo.recompute_category_amount(req.category_id()).await?;
        uow.commit().await?;

        let verdict = persisting.finish();
        tracing::info!(expense_id = id, category_id = req.category_id(), amount = req.amount(), "expense created");
        Self::receipt(db, user_id, id, verdict).await
    }

    #[instrument(skip(db, raw))]
    pub async fn update_expense(
        db: &Database,
        user_id: i64,
        id: i64,
        raw: RawExpenseRequest,
    ) -> Result<ExpenseWrite, ExpenseError> {
        let existing = Self::get_expense(db, user_id, id).await?;
        let req = CreateExpenseRequest::from_raw(raw).map_err(ExpenseError::InvalidInput)?;
        let category = CategoryService::get_category(db, user_id, req.category_id()).await?;

        let attempt = MutationAttempt::start("expense.update");
        let outcome = match Self::check(db, user_id, &category, req.date(), req.amount(), Some(&existing)).await {
            Ok(verdict) => Ok(verdict),
            Err(ExpenseError::Rejected(rejection)) => Err(rejection),
            Err(other) => return Err(other),
        };
        let persisting = attempt.decide(outcome)?.persist();

        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());
        repo.update(id, &req).await?;
        repo.recompute_category_amount(req.category_id()).await?;
        if existing.category_id != req.category_id() {
            repo.recompute_category_amount(existing.category_id).await?;
        }
        uow.commit().await?;

        let verdict = persisting.finish();
        Self::receipt(db, user_id, id, verdict).await
    }

    /// Removing spend cannot break either rule, so the attempt is accepted
    /// outright. Returns the category as recomputed.
    #[instrument(skip(db))]
    pub async fn delete_expense(db: &Database, user_id: i64, id: i64) -> Result<Category, ExpenseError> {
        let existing = Self::get_expense(db, user_id, id).await?;

        let persisting = MutationAttempt::start("expense.delete").decide(Ok(Verdict::default()))?.persist();

        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());
        repo.delete(id).await?;
        repo.recompute_category_amount(existing.category_id).await?;
        uow.commit().await?;

        persisting.finish();
        let category = CategoryService::get_category(db, user_id, existing.category_id).await?;
        Ok(category)
    }

    async fn receipt(db: &Database, user_id: i64, id: i64, verdict: Verdict) -> Result<ExpenseWrite, ExpenseError> {
        let expense = Self::get_expense(db, user_id, id).await?;
        let category = CategoryService::get_category(db, user_id, expense.category_id).await?;
        Ok(ExpenseWrite { expense, category, verdict })
    }

    #[instrument(skip(db))]
    pub async fn get_expense(db: &Database, user_id: i64, id: i64) -> Result<Expense, ExpenseError> {
        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let expense = repo.find_by_id(user_id, id).await?.ok_or(ExpenseError::NotFound("Expense"))?;
        Ok(expense)
    }

    #[instrument(skip(db))]
    pub async fn list_expenses(
        db: &Database,
        user_id: i64,
        month: Option<MonthYear>,
        category_id: Option<i64>,
    ) -> Result<Vec<Expense>, ExpenseError> {
        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());

        let expenses = repo.list(user_id, month, category_id).await?;
        Ok(expenses)
    }

    #[instrument(skip(db))]
    pub async fn monthly_summary(db: &Database, user_id: i64, month: MonthYear) -> Result<MonthlyExpenseSummary, ExpenseError> {
        let income = IncomeService::total_income_for_month(db, user_id, month).await?;

        let mut uow = db.begin().await?;
        let mut repo = ExpenseRepository::new(uow.connection());
        let monthly_expense_total = repo.monthly_total(user_id, month, None).await?;

        Ok(MonthlyExpenseSummary {
            monthly_expense_total,
            remaining_income: income - monthly_expense_total,
        })
    }
}
