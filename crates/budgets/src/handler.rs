use crate::models::{
    BudgetSummaryView, BudgetView, CategoryTotalsView, CategoryView, RawBudgetRequest, RawCategoryRequest,
    ValidateBudgetRequest,
};
use crate::service::{BudgetError, BudgetService};
use crate::category_service::CategoryService;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::{auth::CurrentUser, response, ApiFailure, ApiResponse, AppState, MonthQuery};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validation::to_cents;
use validator::Validate;

pub const BUDGET_HAS_CATEGORIES: &str = "BUDGET_HAS_CATEGORIES";

impl IntoResponse for BudgetError {
    fn into_response(self) -> Response {
        let failure = match self {
            BudgetError::InvalidInput(msg) => ApiFailure::new(StatusCode::BAD_REQUEST, response::INVALID_INPUT, msg),
            BudgetError::Rejected(rejection) => {
                ApiFailure::new(StatusCode::BAD_REQUEST, rejection.code.as_str(), rejection.message)
            }
            BudgetError::HasCategories(count) => ApiFailure::new(
                StatusCode::CONFLICT,
                BUDGET_HAS_CATEGORIES,
                format!("Budget still has {} categories. Delete them first.", count),
            ),
            BudgetError::NotFound(what) => {
                ApiFailure::new(StatusCode::NOT_FOUND, response::NOT_FOUND, format!("{} not found", what))
            }
            BudgetError::Infrastructure(e) => {
                tracing::error!("budget infrastructure error: {}", e);
                ApiFailure::internal()
            }
        };
        failure.into_response()
    }
}

pub fn budget_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_budgets).post(create_budget))
        .route("/summary", get(budget_summary))
        .route("/validate-creation", post(validate_creation))
        .route("/validate-update/{id}", post(validate_update))
        .route("/categories/{id}", get(get_category).put(rename_category).delete(delete_category))
        .route("/{id}", get(get_budget).put(update_budget).delete(delete_budget))
        .route("/{id}/can-delete", get(can_delete))
        .route("/{id}/categories", get(list_categories).post(create_category))
        .with_state(state)
}

async fn list_budgets(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<MonthQuery>,
) -> Result<ApiResponse<Vec<BudgetView>>, BudgetError> {
    let month = params.resolve(state.clock.today()).map_err(BudgetError::InvalidInput)?;
    let budgets = BudgetService::list_budgets(&state.db, user.user_id, month).await?;
    Ok(ApiResponse::ok(budgets.into_iter().map(BudgetView::from).collect()))
}

async fn create_budget(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<RawBudgetRequest>,
) -> Result<impl IntoResponse, BudgetError> {
    payload.validate().map_err(|e| BudgetError::InvalidInput(e.to_string()))?;
    let id = BudgetService::create_budget(&state.db, state.clock.as_ref(), user.user_id, payload).await?;
    let budget = BudgetService::get_budget(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::created(BudgetView::from(budget)))
}

async fn budget_summary(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<MonthQuery>,
) -> Result<ApiResponse<BudgetSummaryView>, BudgetError> {
    let month = params.resolve(state.clock.today()).map_err(BudgetError::InvalidInput)?;
    let summary = BudgetService::budget_summary(&state.db, user.user_id, month).await?;
    Ok(ApiResponse::ok(summary.into()))
}

async fn validate_creation(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<ValidateBudgetRequest>,
) -> Result<ApiResponse<()>, BudgetError> {
    payload.validate().map_err(|e| BudgetError::InvalidInput(e.to_string()))?;
    let month = MonthQuery { month: payload.month, year: payload.year }
        .resolve(state.clock.today())
        .map_err(BudgetError::InvalidInput)?;
    let target_amount = to_cents(payload.target_amount).map_err(BudgetError::InvalidInput)?;
    BudgetService::validate_budget_creation(&state.db, user.user_id, target_amount, month).await?;
    Ok(ApiResponse::accepted())
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ValidateUpdateRequest {
    #[validate(range(min = 0.0, max = 1_000_000_000_000.0))]
    target_amount: f64,
}

async fn validate_update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ValidateUpdateRequest>,
) -> Result<ApiResponse<()>, BudgetError> {
    payload.validate().map_err(|e| BudgetError::InvalidInput(e.to_string()))?;
    let target_amount = to_cents(payload.target_amount).map_err(BudgetError::InvalidInput)?;
    BudgetService::validate_budget_update(&state.db, user.user_id, id, target_amount).await?;
    Ok(ApiResponse::accepted())
}

async fn get_budget(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<BudgetView>, BudgetError> {
    let budget = BudgetService::get_budget(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(budget.into()))
}

async fn update_budget(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RawBudgetRequest>,
) -> Result<ApiResponse<BudgetView>, BudgetError> {
    payload.validate().map_err(|e| BudgetError::InvalidInput(e.to_string()))?;
    let budget = BudgetService::update_budget(&state.db, user.user_id, id, payload).await?;
    Ok(ApiResponse::ok(budget.into()))
}

async fn delete_budget(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, BudgetError> {
    BudgetService::delete_budget(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(json!({ "deleted": id })))
}

async fn can_delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, BudgetError> {
    let can_delete = BudgetService::can_delete_budget(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(json!({ "canDelete": can_delete })))
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(budget_id): Path<i64>,
) -> Result<ApiResponse<Vec<CategoryView>>, BudgetError> {
    let categories = CategoryService::list_categories(&state.db, user.user_id, budget_id).await?;
    Ok(ApiResponse::ok(categories.into_iter().map(CategoryView::from).collect()))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(budget_id): Path<i64>,
    Json(payload): Json<RawCategoryRequest>,
) -> Result<impl IntoResponse, BudgetError> {
    payload.validate().map_err(|e| BudgetError::InvalidInput(e.to_string()))?;
    let id = CategoryService::add_category(&state.db, user.user_id, budget_id, payload).await?;
    let category = CategoryService::get_category(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::created(CategoryView::from(category)))
}

async fn get_category(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CategoryTotalsView>, BudgetError> {
    let category = CategoryService::get_category(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(CategoryTotalsView::from(&category)))
}

async fn rename_category(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RawCategoryRequest>,
) -> Result<ApiResponse<CategoryView>, BudgetError> {
    payload.validate().map_err(|e| BudgetError::InvalidInput(e.to_string()))?;
    let category = CategoryService::rename_category(&state.db, user.user_id, id, payload).await?;
    Ok(ApiResponse::ok(category.into()))
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, BudgetError> {
    CategoryService::delete_category(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(json!({ "deleted": id })))
}
