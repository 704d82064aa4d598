//! # Gateway Errors
//!
//! Every failure the gateway reports over HTTP is first expressed as a gRPC [`Status`], then
//! rendered with the standard gRPC to HTTP status mapping and a JSON body shaped like
//! `google.rpc.Status`:
//!
//! ```json
//! {"code": 3, "message": "...", "details": []}
//! ```
use crate::grpc::client::GrpcRequestError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tonic::{Code, Status};

/// Errors produced while proxying a single HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Decode(String),
    #[error(transparent)]
    Request(#[from] GrpcRequestError),
    #[error("{}", .0.message())]
    Upstream(Status),
    #[error("Failed to encode response as JSON: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Not Found")]
    NotFound,
}

impl GatewayError {
    /// The gRPC status this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            GatewayError::Decode(msg) => Status::invalid_argument(msg.clone()),
            GatewayError::Request(err @ GrpcRequestError::ClientNotReady(_)) => {
                Status::unavailable(err.to_string())
            }
            GatewayError::Request(err) => Status::invalid_argument(err.to_string()),
            GatewayError::Upstream(status) => status.clone(),
            GatewayError::Encode(_) => Status::internal(self.to_string()),
            GatewayError::NotFound => Status::not_found(self.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            GatewayError::Upstream(_) | GatewayError::NotFound => {
                let message = status.message();
                tracing::debug!(code = ?status.code(), message, "request failed");
            }
            _ => tracing::warn!(code = ?status.code(), error = %self, "request failed"),
        }

        (http_status(status.code()), Json(ErrorBody::from(&status))).into_response()
    }
}

/// JSON rendering of a gRPC status.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
    pub details: Vec<serde_json::Value>,
}

impl From<&Status> for ErrorBody {
    fn from(status: &Status) -> Self {
        Self {
            code: status.code() as i32,
            message: status.message().to_string(),
            details: Vec::new(),
        }
    }
}

/// Maps a gRPC status code onto the HTTP status a JSON client sees.
pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        // Client Closed Request, non-standard but conventional for cancellations.
        Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
        Code::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists => StatusCode::CONFLICT,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::FailedPrecondition => StatusCode::BAD_REQUEST,
        Code::Aborted => StatusCode::CONFLICT,
        Code::OutOfRange => StatusCode::BAD_REQUEST,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_grpc_codes_to_http() {
        let cases = [
            (Code::Ok, 200),
            (Code::Cancelled, 499),
            (Code::InvalidArgument, 400),
            (Code::DeadlineExceeded, 504),
            (Code::NotFound, 404),
            (Code::AlreadyExists, 409),
            (Code::PermissionDenied, 403),
            (Code::Unauthenticated, 401),
            (Code::ResourceExhausted, 429),
            (Code::FailedPrecondition, 400),
            (Code::Unimplemented, 501),
            (Code::Internal, 500),
            (Code::Unavailable, 503),
        ];

        for (code, expected) in cases {
            assert_eq!(http_status(code).as_u16(), expected, "{code:?}");
        }
    }

    #[test]
    fn decode_errors_are_invalid_argument() {
        let status = GatewayError::Decode("bad json".to_string()).status();

        assert_eq!(status.code(), Code::InvalidArgument);
        assert_eq!(status.message(), "bad json");
    }

    #[test]
    fn unready_client_is_unavailable() {
        let err = GatewayError::from(GrpcRequestError::ClientNotReady("connection refused".into()));

        assert_eq!(err.status().code(), Code::Unavailable);
    }

    #[test]
    fn error_body_carries_code_and_message() {
        let body = ErrorBody::from(&Status::not_found("no such book"));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"code": 5, "message": "no such book", "details": []})
        );
    }
}
