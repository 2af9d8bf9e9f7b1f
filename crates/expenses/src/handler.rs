use crate::models::{
    ExpenseReceipt, ExpenseView, MonthlyExpenseSummaryView, RawExpenseRequest, ValidateAdditionRequest,
    ValidateEditRequest,
};
use crate::service::{ExpenseError, ExpenseService, ExpenseWrite};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use budgets::models::CategoryView;
use common::{auth::CurrentUser, response, ApiFailure, ApiResponse, AppState, MonthQuery};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validation::Verdict;
use validator::Validate;

impl IntoResponse for ExpenseError {
    fn into_response(self) -> Response {
        let failure = match self {
            ExpenseError::InvalidInput(msg) => ApiFailure::new(StatusCode::BAD_REQUEST, response::INVALID_INPUT, msg),
            ExpenseError::Rejected(rejection) => {
                ApiFailure::new(StatusCode::BAD_REQUEST, rejection.code.as_str(), rejection.message)
            }
            ExpenseError::NotFound(what) => {
                ApiFailure::new(StatusCode::NOT_FOUND, response::NOT_FOUND, format!("{} not found", what))
            }
            ExpenseError::Infrastructure(e) => {
                tracing::error!("expense infrastructure error: {}", e);
                ApiFailure::internal()
            }
        };
        failure.into_response()
    }
}

impl From<ExpenseWrite> for ExpenseReceipt {
    fn from(write: ExpenseWrite) -> Self {
        ExpenseReceipt {
            expense: write.expense.into(),
            category: write.category.into(),
            warning: write.verdict.warning,
        }
    }
}

/// `{"success": true}`, or with `data.warning` when the category is near or
/// over its target.
fn verdict_response(verdict: Verdict) -> Response {
    match verdict.warning {
        Some(warning) => ApiResponse::ok(json!({ "warning": warning })).into_response(),
        None => ApiResponse::accepted().into_response(),
    }
}

pub fn expense_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/monthly-summary", get(monthly_summary))
        .route("/validate-addition", post(validate_addition))
        .route("/validate-edit", post(validate_edit))
        .route("/{id}", get(get_expense).put(update_expense).delete(delete_expense))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListExpensesQuery {
    month: Option<u32>,
    year: Option<i32>,
    #[serde(alias = "categoryID")]
    category_id: Option<i64>,
}

async fn list_expenses(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<ListExpensesQuery>,
) -> Result<ApiResponse<Vec<ExpenseView>>, ExpenseError> {
    let month = if params.month.is_some() || params.year.is_some() {
        let query = MonthQuery { month: params.month, year: params.year };
        Some(query.resolve(state.clock.today()).map_err(ExpenseError::InvalidInput)?)
    } else {
        None
    };
    let expenses = ExpenseService::list_expenses(&state.db, user.user_id, month, params.category_id).await?;
    Ok(ApiResponse::ok(expenses.into_iter().map(ExpenseView::from).collect()))
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<RawExpenseRequest>,
) -> Result<impl IntoResponse, ExpenseError> {
    payload.validate().map_err(|e| ExpenseError::InvalidInput(e.to_string()))?;
    let write = ExpenseService::create_expense(&state.db, user.user_id, payload).await?;
    Ok(ApiResponse::created(ExpenseReceipt::from(write)))
}

async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<MonthQuery>,
) -> Result<ApiResponse<MonthlyExpenseSummaryView>, ExpenseError> {
    let month = params.resolve(state.clock.today()).map_err(ExpenseError::InvalidInput)?;
    let summary = ExpenseService::monthly_summary(&state.db, user.user_id, month).await?;
    Ok(ApiResponse::ok(summary.into()))
}

async fn validate_addition(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<ValidateAdditionRequest>,
) -> Result<Response, ExpenseError> {
    payload.validate().map_err(|e| ExpenseError::InvalidInput(e.to_string()))?;
    let proposal = payload.proposal().map_err(ExpenseError::InvalidInput)?;
    let verdict = ExpenseService::validate_expense_addition(&state.db, user.user_id, proposal).await?;
    Ok(verdict_response(verdict))
}

async fn validate_edit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<ValidateEditRequest>,
) -> Result<Response, ExpenseError> {
    payload.validate().map_err(|e| ExpenseError::InvalidInput(e.to_string()))?;
    let edit = payload.proposal().map_err(ExpenseError::InvalidInput)?;
    let verdict = ExpenseService::validate_expense_edit(&state.db, user.user_id, edit).await?;
    Ok(verdict_response(verdict))
}

async fn get_expense(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<ExpenseView>, ExpenseError> {
    let expense = ExpenseService::get_expense(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(expense.into()))
}

async fn update_expense(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RawExpenseRequest>,
) -> Result<ApiResponse<ExpenseReceipt>, ExpenseError> {
    payload.validate().map_err(|e| ExpenseError::InvalidInput(e.to_string()))?;
    let write = ExpenseService::update_expense(&state.db, user.user_id, id, payload).await?;
    Ok(ApiResponse::ok(write.into()))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CategoryView>, ExpenseError> {
    let category = ExpenseService::delete_expense(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(category.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        Extension,
    };
    use chrono::NaiveDate;
    use common::{Config, FixedClock};
    use database::get_test_db;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = get_test_db().await;
        let config = Config {
            database_url: "mem".into(),
            port: 0,
            app_password: None,
            default_user_id: 1,
        };
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()));
        let state = Arc::new(AppState { db, config, clock });
        Router::new()
            .nest("/income", income::handler::income_router(state.clone()))
            .nest("/budget", budgets::handler::budget_router(state.clone()))
            .nest("/expense", expense_router(state.clone()))
            .layer(Extension(CurrentUser { user_id: 1 }))
            .with_state(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Income of 2000 in March and a "Groceries" budget of 500. Returns the
    /// default category's id.
    async fn seed(app: &Router) -> i64 {
        send(app, post_json("/income", json!({
            "type": "Active",
            "source": "Employer",
            "title": "Salary",
            "amount": 2000,
            "date": "2026-03-01"
        })))
        .await;
        let (_, budget) = send(app, post_json("/budget", json!({ "budgetName": "Groceries", "targetAmount": 500 }))).await;
        let budget_id = budget["data"]["budgetID"].as_i64().unwrap();

        let request = Request::builder().uri(format!("/budget/{}/categories", budget_id)).body(Body::empty()).unwrap();
        let (_, categories) = send(app, request).await;
        categories["data"][0]["categoryID"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_validate_addition_contract() {
        let app = test_app().await;
        let category_id = seed(&app).await;

        let (status, body) = send(&app, post_json("/expense/validate-addition", json!({
            "categoryId": category_id, "amount": 100, "date": "2026-03-10"
        }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (status, body) = send(&app, post_json("/expense/validate-addition", json!({
            "categoryId": category_id, "amount": 450, "date": "2026-03-10"
        }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["warning"]["code"], "CATEGORY_BUDGET_WARNING");
        assert_eq!(body["data"]["warning"]["level"], "APPROACHING");

        let (status, body) = send(&app, post_json("/expense/validate-addition", json!({
            "categoryId": category_id, "amount": 10, "date": "2026-05-10"
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NO_INCOME");
    }

    #[tokio::test]
    async fn test_huge_amounts_are_invalid_input() {
        let app = test_app().await;
        let category_id = seed(&app).await;

        let (status, body) = send(&app, post_json("/expense/validate-addition", json!({
            "categoryId": category_id, "amount": 1e20, "date": "2026-03-10"
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");

        let (status, body) = send(&app, post_json("/expense", json!({
            "categoryID": category_id, "title": "Shop", "amount": 1e20, "date": "2026-03-10"
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_create_expense_reports_category_and_warning() {
        let app = test_app().await;
        let category_id = seed(&app).await;

        let (status, _) = send(&app, post_json("/expense", json!({
            "categoryID": category_id, "title": "Weekly shop", "amount": 350, "date": "2026-03-05"
        }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, post_json("/expense", json!({
            "categoryID": category_id, "title": "Top-up", "amount": 90, "date": "2026-03-06"
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["category"]["categoryAmount"], 440.0);
        assert_eq!(body["data"]["warning"]["percentage"], 88.0);

        let request = Request::builder().uri(format!("/budget/categories/{}", category_id)).body(Body::empty()).unwrap();
        let (_, body) = send(&app, request).await;
        assert_eq!(body, json!({ "success": true, "data": { "categoryAmount": 440.0, "targetAmount": 500.0 } }));
    }

    #[tokio::test]
    async fn test_monthly_summary_contract() {
        let app = test_app().await;
        let category_id = seed(&app).await;
        send(&app, post_json("/expense", json!({
            "categoryID": category_id, "title": "Shop", "amount": 120, "date": "2026-03-05"
        }))).await;

        let request = Request::builder().uri("/expense/monthly-summary?month=3&year=2026").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": { "monthlyExpenseTotal": 120.0, "remainingIncome": 1880.0 } }));
    }

    #[tokio::test]
    async fn test_validate_edit_and_delete() {
        let app = test_app().await;
        let category_id = seed(&app).await;
        let (_, created) = send(&app, post_json("/expense", json!({
            "categoryID": category_id, "title": "Shop", "amount": 1500, "date": "2026-03-05"
        }))).await;
        let expense_id = created["data"]["expense"]["expenseID"].as_i64().unwrap();

        // 2000 income: replacing 1500 with 2000 fits, 2000.01 does not
        let (status, _) = send(&app, post_json("/expense/validate-edit", json!({ "expenseId": expense_id, "newAmount": 2000 }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, post_json("/expense/validate-edit", json!({ "expenseId": expense_id, "newAmount": 2000.01 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EXCEEDS_INCOME");

        let request = Request::builder().method("DELETE").uri(format!("/expense/{}", expense_id)).body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["categoryAmount"], 0.0);
    }
}
