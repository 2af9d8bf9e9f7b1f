//! JSON envelope shared by every route:
//! `{"success": true, "data": ...}` or `{"success": false, "code": ..., "message": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

pub const INVALID_INPUT: &str = "INVALID_INPUT";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const UNKNOWN: &str = "UNKNOWN";

#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { status: StatusCode::OK, data: Some(data) }
    }

    pub fn created(data: T) -> Self {
        Self { status: StatusCode::CREATED, data: Some(data) }
    }
}

impl ApiResponse<()> {
    /// `{"success": true}` with no data, used by validation checks that pass.
    pub fn accepted() -> Self {
        Self { status: StatusCode::OK, data: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = match self.data {
            Some(data) => json!({ "success": true, "data": data }),
            None => json!({ "success": true }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiFailure {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, UNKNOWN, "Internal server error")
    }

    pub fn body(&self) -> Value {
        json!({ "success": false, "code": self.code, "message": self.message })
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = self.body();
        (self.status, Json(body)).into_response()
    }
}
