//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Observability (tracing, request IDs)
//! - Recovery (panics, handler timeouts)
//! - Body timeouts (stalled uploads and downloads)
//!
//! ```rust,no_run
//! use axum::Router;
//! use streamer_server::middleware::{
//!     RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt, RouterTimeoutExt,
//!     TransferTimeoutConfig,
//! };
//!
//! let app: Router = Router::new()
//!     .with_transfer_timeouts(&TransferTimeoutConfig::default())
//!     .with_recovery(&RecoveryConfig::default())
//!     .with_observability();
//! ```

mod observability;
mod recovery;
mod timeouts;

pub use observability::{REQUEST_ID_HEADER, RouterObservabilityExt};
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use timeouts::{RouterTimeoutExt, TransferTimeoutConfig};
