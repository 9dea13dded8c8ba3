use crate::error::{Error, ValidationErrors};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// The JSON envelope every endpoint speaks: a boolean status flag, a human
/// message, and optional data / field-error payloads.
#[derive(Debug, Serialize)]
pub struct ApiBody<T: Serialize> {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

pub fn success<T: Serialize>(code: StatusCode, message: impl Into<String>, data: T) -> Response {
    (
        code,
        Json(ApiBody {
            status: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }),
    )
        .into_response()
}

/// Crate error carried across the handler boundary; rendering picks the HTTP
/// status and hides internal detail from the caller.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message, errors) = match self.0 {
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(errors),
            ),
            Error::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
            err @ (Error::AlreadySubmitted
            | Error::TaskExhausted
            | Error::AlreadyProcessed
            | Error::Gateway(_)) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            err => {
                error!("request failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                    None,
                )
            }
        };
        (
            code,
            Json(ApiBody::<()> {
                status: false,
                message,
                data: None,
                errors,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(ValidationErrors::field("amount", "too small")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(Error::NotFound("task")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(Error::AlreadySubmitted), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::TaskExhausted), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::AlreadyProcessed), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::Gateway("declined".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::internal("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
