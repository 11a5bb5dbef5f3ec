//! HTTP listener with bounded graceful shutdown.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;
use crate::server::listener::IdleTimeoutListener;
use crate::server::{ServerError, ServerResult};

/// Binds `addr` and serves `app` until `signal` resolves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or accepting fails.
pub async fn serve_http<F>(
    addr: SocketAddr,
    app: Router,
    idle_timeout: Duration,
    shutdown_timeout: Duration,
    signal: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| ServerError::bind_error(addr, err))?;

    serve_http_on(listener, app, idle_timeout, shutdown_timeout, signal).await
}

/// Serves `app` on an already bound listener.
///
/// Once `signal` resolves the listener stops accepting and waits for
/// in-flight requests, for at most `shutdown_timeout`. Reaching that ceiling
/// still counts as a clean stop.
pub async fn serve_http_on<F>(
    listener: TcpListener,
    app: Router,
    idle_timeout: Duration,
    shutdown_timeout: Duration,
    signal: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (draining, drain_started) = oneshot::channel();
    let signal = async move {
        signal.await;
        let _ = draining.send(());
    };

    let listener = IdleTimeoutListener::new(listener, idle_timeout);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result.map_err(ServerError::Runtime),
        Ok(()) = drain_started => {}
    }

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        timeout_secs = shutdown_timeout.as_secs(),
        "Draining in-flight requests"
    );

    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(result) => result.map_err(ServerError::Runtime),
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = shutdown_timeout.as_secs(),
                "Shutdown timeout elapsed, abandoning in-flight requests"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::routing::get;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    use super::*;

    const IDLE: Duration = Duration::from_secs(5);

    async fn request(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn serves_until_signalled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/health", get(|| async { "ok" }));

        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_http_on(
            listener,
            app,
            IDLE,
            Duration::from_secs(5),
            async move {
                let _ = stopped.await;
            },
        ));

        let response = request(addr, "/health").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        stop.send(()).unwrap();
        let outcome = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn shutdown_is_bounded_by_the_ceiling() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let started = Arc::new(Notify::new());
        let handler_started = started.clone();
        let app = Router::new().route(
            "/stuck",
            get(move || {
                let handler_started = handler_started.clone();
                async move {
                    handler_started.notify_one();
                    std::future::pending::<&'static str>().await
                }
            }),
        );

        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_http_on(
            listener,
            app,
            IDLE,
            Duration::from_millis(100),
            async move {
                let _ = stopped.await;
            },
        ));

        let client = tokio::spawn(request(addr, "/stuck"));
        started.notified().await;

        stop.send(()).unwrap();
        let outcome = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
        assert!(outcome.is_ok());

        client.abort();
    }

    #[tokio::test]
    async fn occupied_address_is_a_bind_error() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = occupied.local_addr().unwrap();

        let outcome = serve_http(
            addr,
            Router::new(),
            IDLE,
            Duration::from_secs(1),
            std::future::pending(),
        )
        .await;

        assert!(matches!(outcome, Err(ServerError::BindError { .. })));
    }
}
