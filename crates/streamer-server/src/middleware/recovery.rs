//! Panic capture and the per-request deadline.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::ErrorKind;

const TRACING_TARGET: &str = "streamer_server::middleware::recovery";

/// Deadline shared by the HTTP and RPC routers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Seconds a handler may run before it is answered with a 500. Bodies
    /// already streaming are bounded by the request context instead.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value = "30")
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: 30,
        }
    }
}

impl RecoveryConfig {
    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Turns handler panics and overrun deadlines into JSON 500 responses.
pub trait RouterRecoveryExt<S> {
    fn with_recovery(self, config: &RecoveryConfig) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        let middlewares = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(timed_out))
            .layer(CatchPanicLayer::custom(panicked))
            .layer(TimeoutLayer::new(config.request_timeout()));

        self.layer(middlewares)
    }
}

async fn timed_out(err: tower::BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::error!(target: TRACING_TARGET, "Request deadline exceeded");

        return ErrorKind::InternalServerError
            .with_message("Request timeout")
            .with_context("request deadline exceeded")
            .into_response();
    }

    tracing::error!(target: TRACING_TARGET, error = %err, "Middleware failed");
    ErrorKind::InternalServerError.into_response()
}

fn panicked(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    tracing::error!(target: TRACING_TARGET, panic = %detail, "Handler panicked");
    ErrorKind::InternalServerError.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum_test::TestServer;
    use serde_json::Value;

    use super::*;

    fn config(secs: u64) -> RecoveryConfig {
        RecoveryConfig {
            request_timeout: secs,
        }
    }

    #[test]
    fn default_deadline_is_thirty_seconds() {
        assert_eq!(
            RecoveryConfig::default().request_timeout(),
            Duration::from_secs(30)
        );
    }

    #[tokio::test]
    async fn panics_become_internal_errors() -> anyhow::Result<()> {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }

        let app = Router::new()
            .route("/boom", get(boom))
            .with_recovery(&config(30));
        let server = TestServer::new(app)?;

        let response = server.get("/boom").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["name"], "internal_server_error");
        Ok(())
    }

    #[tokio::test]
    async fn slow_handlers_time_out() -> anyhow::Result<()> {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }

        let app = Router::new()
            .route("/slow", get(slow))
            .with_recovery(&config(1));
        let server = TestServer::new(app)?;

        let response = server.get("/slow").await;
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["context"], "request deadline exceeded");
        Ok(())
    }
}
