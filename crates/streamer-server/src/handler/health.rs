//! Liveness probe.

use axum::{Json, Router};
use axum::routing::get;

use crate::handler::response::Health;
use crate::service::ServiceState;

/// Returns `200 OK` while the process is able to serve requests.
///
/// Storage is deliberately not consulted, so a slow object store never
/// causes the process to be restarted.
async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::handler::response::Health;
    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn health_is_ok() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Health>(), Health::ok());
        Ok(())
    }
}
