use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use std::sync::Arc;
use crate::AppState;
use crate::response::{ApiFailure, UNAUTHORIZED};

pub const AUTH_SESSION_KEY: &str = "user_id";

/// The user a request acts for. Every ledger query is scoped by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| ApiFailure::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED, "Login required"))
    }
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    // If no password is set, authentication is disabled
    if state.config.app_password.is_none() {
        request.extensions_mut().insert(CurrentUser { user_id: state.config.default_user_id });
        return next.run(request).await;
    }

    let user_id: Option<i64> = session
        .get(AUTH_SESSION_KEY)
        .await
        .unwrap_or(None);

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(CurrentUser { user_id });
            next.run(request).await
        }
        None => ApiFailure::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED, "Login required").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn whoami(user: CurrentUser) -> String {
        user.user_id.to_string()
    }

    #[tokio::test]
    async fn test_current_user_requires_extension() {
        let app = Router::new().route("/", get(whoami));
        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_from_extension() {
        let app = Router::new()
            .route("/", get(whoami))
            .layer(Extension(CurrentUser { user_id: 7 }));
        let response = app
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"7");
    }
}
