mod handlers;

use axum::{middleware, Router};
use clap::Parser;
use common::{auth::auth_middleware, AppState, Config, SystemClock};
use database::Database;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ledger routes behind the acting-user middleware, plus login and logout.
fn app_router(state: Arc<AppState>) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    let protected_routes = Router::<Arc<AppState>>::new()
        .nest("/income", income::handler::income_router(state.clone()))
        .nest("/budget", budgets::handler::budget_router(state.clone()))
        .nest("/expense", expenses::handler::expense_router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::<Arc<AppState>>::new()
        .nest("/auth", handlers::auth::auth_router(state.clone()))
        .merge(protected_routes)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        clock: Arc::new(SystemClock),
    });

    let app = app_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    if config.app_password.is_none() {
        tracing::warn!(
            user_id = config.default_user_id,
            "APP_PASSWORD is not set, every request acts as the default user"
        );
    }
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use database::get_test_db;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn test_app(app_password: Option<&str>) -> Router {
        let config = Config {
            database_url: "mem".into(),
            port: 0,
            app_password: app_password.map(String::from),
            default_user_id: 1,
        };
        let state = Arc::new(AppState {
            db: get_test_db().await,
            config,
            clock: Arc::new(SystemClock),
        });
        app_router(state)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn login_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn summary_request(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/budget/summary?month=3&year=2026");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_open_when_password_unset() {
        let app = test_app(None).await;
        let response = app.oneshot(summary_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["remainingBudget"], 0.0);
    }

    #[tokio::test]
    async fn test_login_required_when_password_set() {
        let app = test_app(Some("secret")).await;

        let response = app.clone().oneshot(summary_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

        let response = app.clone().oneshot(login_request(json!({ "userId": 5, "password": "wrong" }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.clone().oneshot(login_request(json!({ "userId": 5, "password": "secret" }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();
        assert_eq!(body_json(response).await, json!({ "success": true, "data": { "userId": 5 } }));

        let response = app.oneshot(summary_request(Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_shared_password_serves_every_user() {
        let app = test_app(Some("secret")).await;
        for user_id in [1, 2, 42] {
            let response = app.clone().oneshot(login_request(json!({ "userId": user_id, "password": "secret" }))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["data"]["userId"], user_id);
        }
    }
}
