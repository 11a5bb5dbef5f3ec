//! Interrupted requests as HTTP errors.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::service::Interrupted;

const TRACING_TARGET: &str = "streamer_server::handler::service";

/// A request cut short before its body started is a server-side failure:
/// the client still gets a JSON 500 naming the reason.
impl From<Interrupted> for HttpError<'static> {
    fn from(interrupted: Interrupted) -> Self {
        tracing::warn!(
            target: TRACING_TARGET,
            reason = %interrupted,
            "Request interrupted"
        );

        ErrorKind::InternalServerError.with_context(interrupted.to_string())
    }
}
