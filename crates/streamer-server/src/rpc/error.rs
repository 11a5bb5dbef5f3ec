//! Connect error codes and the JSON error body.

use std::borrow::Cow;
use std::{fmt, io};

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use streamer_storage::StorageError;

use crate::handler::{Error as HttpError, ErrorKind};
use crate::rpc::envelope::EnvelopeError;
use crate::service::Interrupted;

/// Connect status codes used by the transfer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    /// The client went away.
    Canceled,
    /// The request is malformed.
    InvalidArgument,
    /// The request deadline passed.
    DeadlineExceeded,
    /// The requested object does not exist.
    NotFound,
    /// The method is part of the contract but not served.
    Unimplemented,
    /// Anything else.
    Internal,
}

impl Code {
    /// Returns the HTTP status of a unary error response with this code.
    pub fn http_status(self) -> StatusCode {
        match self {
            // 499 Client Closed Request
            Self::Canceled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the wire name of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Canceled => "canceled",
            Self::InvalidArgument => "invalid_argument",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::NotFound => "not_found",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a Connect method.
///
/// Unary methods send it as the response body; streaming methods send it in
/// the end-of-stream envelope.
#[must_use = "errors do nothing unless serialized"]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ConnectError {
    code: Code,
    message: Cow<'static, str>,
}

impl ConnectError {
    /// Creates a new error.
    pub fn new(code: Code, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a `not_found` error.
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// Creates an `invalid_argument` error.
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// Creates an `unimplemented` error.
    pub fn unimplemented(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Code::Unimplemented, message)
    }

    /// Creates an `internal` error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// Returns the code.
    #[inline]
    pub fn code(&self) -> Code {
        self.code
    }

    /// Returns the message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ConnectError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

impl From<HttpError<'_>> for ConnectError {
    fn from(error: HttpError<'_>) -> Self {
        let code = match error.kind() {
            ErrorKind::MissingPathParam | ErrorKind::BadRequest => Code::InvalidArgument,
            ErrorKind::NotFound => Code::NotFound,
            ErrorKind::NotImplemented => Code::Unimplemented,
            ErrorKind::InternalServerError => Code::Internal,
        };

        let response = error.kind().response();
        let message = match error.context().or(error.message()) {
            Some(detail) => detail.to_owned(),
            None => response.message.into_owned(),
        };

        Self::new(code, message)
    }
}

impl From<Interrupted> for ConnectError {
    fn from(interrupted: Interrupted) -> Self {
        let code = match interrupted {
            Interrupted::DeadlineExceeded => Code::DeadlineExceeded,
            Interrupted::Cancelled => Code::Canceled,
        };

        Self::new(code, interrupted.to_string())
    }
}

impl From<io::Error> for ConnectError {
    fn from(error: io::Error) -> Self {
        let code = match error.kind() {
            io::ErrorKind::TimedOut => Code::DeadlineExceeded,
            io::ErrorKind::Interrupted => Code::Canceled,
            _ => Code::Internal,
        };

        Self::new(code, error.to_string())
    }
}

impl From<StorageError> for ConnectError {
    fn from(error: StorageError) -> Self {
        if error.is_not_found() {
            Self::not_found(error.to_string())
        } else {
            Self::internal("storage operation failed")
        }
    }
}

impl From<EnvelopeError> for ConnectError {
    fn from(error: EnvelopeError) -> Self {
        Self::invalid_argument(error.to_string())
    }
}

impl From<serde_json::Error> for ConnectError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_argument(format!("malformed request message: {error}"))
    }
}
