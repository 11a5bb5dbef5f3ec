#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod extract;
pub mod handler;
pub mod middleware;
pub mod rpc;
pub mod service;

pub use crate::error::{Error, Result};

// Tracing target constants for consistent logging.
pub const TRACING_TARGET_SERVICE: &str = "streamer_server::service";
pub const TRACING_TARGET_HANDLER: &str = "streamer_server::handler";
pub const TRACING_TARGET_RPC: &str = "streamer_server::rpc";
