use crate::models::{IncomeView, MonthlyIncomeView, RawIncomeRequest, RecordOccurrenceRequest};
use crate::service::{IncomeError, IncomeService};
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
use validator::Validate;

impl IntoResponse for IncomeError {
    fn into_response(self) -> Response {
        let failure = match self {
            IncomeError::InvalidInput(msg) => ApiFailure::new(StatusCode::BAD_REQUEST, response::INVALID_INPUT, msg),
            IncomeError::Conflict(msg) => ApiFailure::new(StatusCode::CONFLICT, response::INVALID_INPUT, msg),
            IncomeError::NotFound => ApiFailure::new(StatusCode::NOT_FOUND, response::NOT_FOUND, "Income not found"),
            IncomeError::Infrastructure(e) => {
                tracing::error!("income infrastructure error: {}", e);
                ApiFailure::internal()
            }
        };
        failure.into_response()
    }
}

pub fn income_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_incomes).post(create_income))
        .route("/check-monthly", get(check_monthly))
        .route("/{id}", get(get_income).put(update_income).delete(delete_income))
        .route("/{id}/occurrences", post(record_occurrence))
        .with_state(state)
}

async fn check_monthly(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<MonthQuery>,
) -> Result<ApiResponse<MonthlyIncomeView>, IncomeError> {
    let month = params.resolve(state.clock.today()).map_err(IncomeError::InvalidInput)?;
    let result = IncomeService::has_income_for_month(&state.db, user.user_id, month).await?;
    Ok(ApiResponse::ok(result.into()))
}

async fn list_incomes(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(params): Query<MonthQuery>,
) -> Result<ApiResponse<Vec<IncomeView>>, IncomeError> {
    let month = if params.month.is_some() || params.year.is_some() {
        Some(params.resolve(state.clock.today()).map_err(IncomeError::InvalidInput)?)
    } else {
        None
    };
    let incomes = IncomeService::list_incomes(&state.db, user.user_id, month).await?;
    Ok(ApiResponse::ok(incomes.into_iter().map(IncomeView::from).collect()))
}

async fn create_income(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<RawIncomeRequest>,
) -> Result<impl IntoResponse, IncomeError> {
    payload.validate().map_err(|e| IncomeError::InvalidInput(e.to_string()))?;
    let id = IncomeService::add_income(&state.db, user.user_id, payload).await?;
    let income = IncomeService::get_income(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::created(IncomeView::from(income)))
}

async fn get_income(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<IncomeView>, IncomeError> {
    let income = IncomeService::get_income(&state.db, user.user_id, id).await?;
    Ok(ApiResponse::ok(income.into()))
}

async fn update_income(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RawIncomeRequest>,
) -> Result<ApiResponse<IncomeView>, IncomeError> {
    payload.validate().map_err(|e| IncomeError::InvalidInput(e.to_string()))?;
    let income = IncomeService::update_income(&state.db, user.user_id, id, payload).await?;
    Ok(ApiResponse::ok(income.into()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteIncomeQuery {
    #[serde(default)]
    delete_all_recurrences: bool,
}

async fn delete_income(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(params): Query<DeleteIncomeQuery>,
) -> Result<impl IntoResponse, IncomeError> {
    let removed = IncomeService::delete_income(&state.db, user.user_id, id, params.delete_all_recurrences).await?;
    Ok(ApiResponse::ok(json!({ "removed": removed })))
}

async fn record_occurrence(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecordOccurrenceRequest>,
) -> Result<impl IntoResponse, IncomeError> {
    payload.validate().map_err(|e| IncomeError::InvalidInput(e.to_string()))?;
    let child = IncomeService::record_occurrence(&state.db, user.user_id, id, &payload.date, payload.amount).await?;
    let income = IncomeService::get_income(&state.db, user.user_id, child).await?;
    Ok(ApiResponse::created(IncomeView::from(income)))
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
            .nest("/income", income_router(state.clone()))
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

    #[tokio::test]
    async fn test_check_monthly_contract() {
        let app = test_app().await;

        let (status, body) = send(&app, Request::builder().uri("/income/check-monthly?month=3&year=2026").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": { "hasIncome": false, "totalIncome": 0.0 } }));

        let (status, _) = send(&app, post_json("/income", json!({
            "type": "Active",
            "source": "Employer",
            "title": "Salary",
            "amount": 2000,
            "date": "2026-03-01",
            "occurrence": "monthly"
        }))).await;
        assert_eq!(status, StatusCode::CREATED);

        // month/year default to the clock's month
        let (_, body) = send(&app, Request::builder().uri("/income/check-monthly").body(Body::empty()).unwrap()).await;
        assert_eq!(body["data"]["hasIncome"], true);
        assert_eq!(body["data"]["totalIncome"], 2000.0);
    }

    #[tokio::test]
    async fn test_create_income_rejects_invalid_payload() {
        let app = test_app().await;
        let (status, body) = send(&app, post_json("/income", json!({
            "type": "Active",
            "source": "",
            "title": "Salary",
            "amount": 10,
            "date": "2026-03-01"
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_delete_all_recurrences_via_query() {
        let app = test_app().await;
        let (_, created) = send(&app, post_json("/income", json!({
            "type": "Passive",
            "source": "Tenant",
            "title": "Rent",
            "amount": 800,
            "date": "2026-01-05",
            "occurrence": "monthly"
        }))).await;
        let id = created["data"]["incomeID"].as_i64().unwrap();

        let (status, child) = send(&app, post_json(&format!("/income/{}/occurrences", id), json!({ "date": "2026-02-05" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(child["data"]["parentIncomeID"], id);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/income/{}?deleteAllRecurrences=true", id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], 2);
    }
}
