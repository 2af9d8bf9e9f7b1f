use crate::models::{Category, CreateCategoryRequest, RawCategoryRequest};
use crate::budget_repository::BudgetRepository;
use crate::repository::CategoryRepository;
use crate::service::{icon_or_random, BudgetError};
use database::Database;
use tracing::instrument;
use validation::threshold::budget_percentage;

pub struct CategoryService;

impl CategoryService {
    #[instrument(skip(db, raw))]
    pub async fn add_category(
        db: &Database,
        user_id: i64,
        budget_id: i64,
        raw: RawCategoryRequest,
    ) -> Result<i64, BudgetError> {
        let req = CreateCategoryRequest::new(raw.category_name, icon_or_random(raw.icon))
            .map_err(BudgetError::InvalidInput)?;

        let mut uow = db.begin().await?;
        BudgetRepository::new(uow.connection())
            .find_by_id(user_id, budget_id)
            .await?
            .ok_or(BudgetError::NotFound("Budget"))?;

        let id = CategoryRepository::new(uow.connection()).create(budget_id, &req).await?;
        uow.commit().await?;

        Ok(id)
    }

    #[instrument(skip(db))]
    pub async fn get_category(db: &Database, user_id: i64, id: i64) -> Result<Category, BudgetError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        let category = repo.find_by_id(user_id, id).await?.ok_or(BudgetError::NotFound("Category"))?;
        Ok(category)
    }

    /// `prospective_total` as a percentage of the category's budget target.
    /// `None` for a zero target.
    #[instrument(skip(db))]
    pub async fn compute_budget_percentage(
        db: &Database,
        user_id: i64,
        category_id: i64,
        prospective_total: i64,
    ) -> Result<Option<f64>, BudgetError> {
        let category = Self::get_category(db, user_id, category_id).await?;
        Ok(budget_percentage(prospective_total, category.target_amount))
    }

    #[instrument(skip(db))]
    pub async fn list_categories(db: &Database, user_id: i64, budget_id: i64) -> Result<Vec<Category>, BudgetError> {
        let mut uow = db.begin().await?;
        BudgetRepository::new(uow.connection())
            .find_by_id(user_id, budget_id)
            .await?
            .ok_or(BudgetError::NotFound("Budget"))?;

        let categories = CategoryRepository::new(uow.connection()).list_for_budget(user_id, budget_id).await?;
        Ok(categories)
    }

    #[instrument(skip(db, raw))]
    pub async fn rename_category(
        db: &Database,
        user_id: i64,
        id: i64,
        raw: RawCategoryRequest,
    ) -> Result<Category, BudgetError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        let existing = repo.find_by_id(user_id, id).await?.ok_or(BudgetError::NotFound("Category"))?;
        let icon = raw.icon.filter(|i| !i.trim().is_empty()).unwrap_or(existing.icon);
        let req = CreateCategoryRequest::new(raw.category_name, icon).map_err(BudgetError::InvalidInput)?;

        repo.update(user_id, id, &req).await?;
        let category = repo.find_by_id(user_id, id).await?.ok_or(BudgetError::NotFound("Category"))?;
        uow.commit().await?;

        Ok(category)
    }

    /// Removes the category along with every expense filed under it.
    #[instrument(skip(db))]
    pub async fn delete_category(db: &Database, user_id: i64, id: i64) -> Result<(), BudgetError> {
        let mut uow = db.begin().await?;
        let mut repo = CategoryRepository::new(uow.connection());

        repo.delete(user_id, id).await.map_err(|e| match e {
            database::RepositoryError::NotFound => BudgetError::NotFound("Category"),
            other => other.into(),
        })?;
        uow.commit().await?;

        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }
}
