use crate::models::{Category, CreateCategoryRequest};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct CategoryRecord {
    id: i64,
    budget_id: i64,
    category_name: String,
    icon: String,
    category_amount: i64,
    target_amount: i64,
}

impl From<CategoryRecord> for Category {
    fn from(record: CategoryRecord) -> Self {
        Category {
            id: record.id,
            budget_id: record.budget_id,
            category_name: record.category_name,
            icon: record.icon,
            category_amount: record.category_amount,
            target_amount: record.target_amount,
        }
    }
}

// Categories are owned through their budget, so every read joins it for the
// user check and the target.
const SELECT_CATEGORY: &str = "SELECT c.id, c.budget_id, c.category_name, c.icon, c.category_amount, b.target_amount \
     FROM categories c JOIN budgets b ON b.id = c.budget_id";

pub(crate) struct CategoryRepository<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, budget_id: i64, req: &CreateCategoryRequest) -> Result<i64, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (budget_id, category_name, icon) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(budget_id)
        .bind(req.category_name())
        .bind(req.icon())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(id)
    }

    pub async fn list_for_budget(&mut self, user_id: i64, budget_id: i64) -> Result<Vec<Category>, RepositoryError> {
        let records = sqlx::query_as::<_, CategoryRecord>(&format!(
            "{} WHERE c.budget_id = $1 AND b.user_id = $2 ORDER BY c.category_name",
            SELECT_CATEGORY
        ))
        .bind(budget_id)
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    pub async fn find_by_id(&mut self, user_id: i64, id: i64) -> Result<Option<Category>, RepositoryError> {
        let record = sqlx::query_as::<_, CategoryRecord>(&format!(
            "{} WHERE c.id = $1 AND b.user_id = $2",
            SELECT_CATEGORY
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record.map(|r| r.into()))
    }

    pub async fn update(&mut self, user_id: i64, id: i64, req: &CreateCategoryRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE categories SET category_name = $1, icon = $2 \
             WHERE id = $3 AND budget_id IN (SELECT id FROM budgets WHERE user_id = $4)",
        )
        .bind(req.category_name())
        .bind(req.icon())
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Deletes the category; its expenses go with it.
    pub async fn delete(&mut self, user_id: i64, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM categories WHERE id = $1 AND budget_id IN (SELECT id FROM budgets WHERE user_id = $2)",
        )
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
