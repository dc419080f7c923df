use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::usercases::payments::PaymentError;

/// Error body every route renders: `{"success": false, "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Renders a payment error with its mapped status code. Internal errors keep
/// their detail out of the response body.
pub fn payment_error_response(err: &PaymentError) -> Response {
    let message = match err {
        PaymentError::Internal(_) => "Server error".to_string(),
        other => other.to_string(),
    };

    (err.status_code(), Json(ErrorResponse::new(message))).into_response()
}

pub fn server_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Server error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_detail_stays_out_of_the_body() {
        let err = PaymentError::Internal(anyhow::anyhow!(
            "db error: connection refused at 10.0.0.5:5432"
        ));
        let response = payment_error_response(&err);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn known_errors_render_their_own_message() {
        let body = ErrorResponse::new(PaymentError::OrderNotFound.to_string());
        let json = serde_json::to_string(&body).unwrap();

        assert_eq!(
            json,
            "{\"success\":false,\"message\":\"Subscription not found\"}"
        );
    }
}
