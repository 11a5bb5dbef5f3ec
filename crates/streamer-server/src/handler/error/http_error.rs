//! The HTTP handler error: a kind that fixes the status, plus optional detail.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// Failure of an HTTP handler or extractor.
///
/// The [`ErrorKind`] decides the status and the default body. A message,
/// resource or context refines that body without changing the status.
#[must_use = "errors do nothing unless serialized"]
#[derive(Debug, Clone)]
pub struct Error<'a> {
    kind: ErrorKind,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
    context: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates an error carrying only its kind.
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            resource: None,
            context: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Replaces the short, client-facing description.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Names what the request was about, usually `"file"`.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Adds the reason the request failed.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.kind.status_code().as_u16())?;

        if let Some(message) = self.message() {
            write!(f, ": {message}")?;
        }
        if let Some(context) = self.context() {
            write!(f, " ({context})")?;
        }
        if let Some(resource) = self.resource() {
            write!(f, " on {resource}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let mut body = self.kind.response();

        if let Some(message) = self.message {
            body = body.with_message(message);
        }
        if let Some(resource) = self.resource {
            body = body.with_resource(resource);
        }
        if let Some(context) = self.context {
            body = body.with_context(context);
        }

        body.into_response()
    }
}

impl From<ErrorKind> for Error<'static> {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result of an HTTP handler.
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Categories of HTTP failure, one per response status family we send.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400, the route matched but a path segment is absent.
    MissingPathParam,
    /// 400, the file name or request message is invalid.
    BadRequest,
    /// 404, no such file or route.
    NotFound,
    /// 500, storage failure, interrupted request or panic.
    InternalServerError,
    /// 501, part of the contract but not served.
    NotImplemented,
}

impl ErrorKind {
    /// Shorthand for [`Error::with_message`] on a fresh error.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Shorthand for [`Error::with_resource`] on a fresh error.
    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Shorthand for [`Error::with_context`] on a fresh error.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Status the kind is answered with.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Default body for the kind.
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::MissingPathParam => ErrorResponse::MISSING_PATH_PARAM,
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => ErrorResponse::NOT_IMPLEMENTED,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response().name)
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}
