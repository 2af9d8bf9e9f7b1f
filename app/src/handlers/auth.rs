use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use common::{auth::AUTH_SESSION_KEY, response, ApiFailure, ApiResponse, AppState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "userID")]
    pub user_id: i64,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub user_id: i64,
}

pub fn auth_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state)
}

/// Opens a session for `userId`. `APP_PASSWORD` is one password shared by
/// every user, not a per-user credential: whoever holds it may log in as any
/// `userId`. With no password configured any login succeeds.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<LoginView>, ApiFailure> {
    if let Some(correct_password) = &state.config.app_password {
        if payload.password != *correct_password {
            tracing::warn!(user_id = payload.user_id, "login refused");
            return Err(ApiFailure::new(StatusCode::UNAUTHORIZED, response::UNAUTHORIZED, "Invalid password"));
        }
    }

    session.insert(AUTH_SESSION_KEY, payload.user_id).await.map_err(|e| {
        tracing::error!("failed to store session: {}", e);
        ApiFailure::internal()
    })?;

    tracing::info!(user_id = payload.user_id, "logged in");
    Ok(ApiResponse::ok(LoginView { user_id: payload.user_id }))
}

pub async fn logout(session: Session) -> Result<ApiResponse<()>, ApiFailure> {
    session.flush().await.map_err(|e| {
        tracing::error!("failed to clear session: {}", e);
        ApiFailure::internal()
    })?;
    Ok(ApiResponse::accepted())
}
