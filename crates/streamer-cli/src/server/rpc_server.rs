//! Connect RPC listener (HTTP/1.1 and cleartext HTTP/2).

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::server::{ServerError, ServerResult};

/// Binds `addr` and serves `app` until accepting fails.
///
/// The listener does not observe shutdown signals; it stops with the
/// process or when aborted by the supervisor.
pub async fn serve_rpc(addr: SocketAddr, app: Router) -> ServerResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| ServerError::bind_error(addr, err))?;

    serve_rpc_on(listener, app).await
}

/// Serves `app` on an already bound listener.
pub async fn serve_rpc_on(listener: TcpListener, app: Router) -> ServerResult<()> {
    axum::serve(listener, app)
        .await
        .map_err(ServerError::Runtime)
}
