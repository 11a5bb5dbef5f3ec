//! Connect transport of the transfer service.
//!
//! `transfer.v1.TransferService` is served with the JSON codec over plain
//! HTTP/1.1 and cleartext HTTP/2:
//!
//! - `GetFileSize` is unary (`application/json`).
//! - `StreamFile` is server-streaming (`application/connect+json`).
//! - `UploadFile` keeps its bidirectional contract but answers `unimplemented`.

pub mod envelope;
mod error;
pub mod message;
mod transfer;

use axum::Router;
use axum::routing::post;

pub use crate::rpc::error::{Code, ConnectError};
pub use crate::rpc::transfer::MAX_CHUNK_SIZE;
use crate::service::ServiceState;

/// Content type of Connect streaming calls using the JSON codec.
pub const CONNECT_JSON: &str = "application/connect+json";

/// Fully-qualified name of the transfer service.
pub const TRANSFER_SERVICE: &str = "transfer.v1.TransferService";

async fn unknown_procedure() -> ConnectError {
    ConnectError::not_found("unknown procedure")
}

/// Returns the route of a transfer service method, `/<service>/<method>`.
fn procedure(method: &str) -> String {
    format!("/{TRANSFER_SERVICE}/{method}")
}

/// Returns a [`Router`] serving the transfer service.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .route(&procedure("GetFileSize"), post(transfer::get_file_size))
        .route(&procedure("StreamFile"), post(transfer::stream_file))
        .route(&procedure("UploadFile"), post(transfer::upload_file))
        .fallback(unknown_procedure)
        .with_state(state)
}
