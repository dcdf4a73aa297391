//! Success response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{"data": ..., "message": "..."}` body returned by every user endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub message: String,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status: StatusCode::OK,
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::ok(serde_json::json!({"access_token": "abc"}), "done");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["data"]["access_token"], "abc");
        assert_eq!(json["message"], "done");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created("x", "made").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
