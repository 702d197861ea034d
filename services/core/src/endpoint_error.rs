use std::error::Error;
use std::fmt::Display;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use strum::AsRefStr;

use crate::operation_error::OperationError;

#[derive(Debug, AsRefStr)]
pub enum EndpointError<E: OperationError> {
    Validation(String),
    Unauthenticated,
    Internal,
    Operation(E),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl<E: OperationError> EndpointError<E> {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    pub fn operation(err: E) -> Self {
        Self::Operation(err)
    }

    /// The message returned to the caller. The cause of internal errors is logged where it happens and
    /// never leaves the service.
    pub fn message(&self) -> String {
        match self {
            EndpointError::Validation(msg) => msg.clone(),
            EndpointError::Unauthenticated => String::from("Authentication required."),
            EndpointError::Internal => String::from("Internal server error."),
            EndpointError::Operation(err) => err.to_string(),
        }
    }
}

impl<E: OperationError> OperationError for EndpointError<E> {
    fn code(&self) -> StatusCode {
        match self {
            EndpointError::Validation(_) => StatusCode::BAD_REQUEST,
            EndpointError::Unauthenticated => StatusCode::UNAUTHORIZED,
            EndpointError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            EndpointError::Operation(e) => e.code(),
        }
    }
}

impl<E: OperationError> Error for EndpointError<E> {}

impl<E: OperationError> Display for EndpointError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind: &str = self.as_ref();
        write!(f, "{}: {}", kind, self.message())
    }
}

impl<E: OperationError> ResponseError for EndpointError<E> {
    fn status_code(&self) -> StatusCode {
        self.code()
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.message();
        HttpResponse::build(self.status_code()).json(ErrorBody { message: &message })
    }
}
