//! Request extractors with error handling mapped onto [`handler::Error`].
//!
//! - [`Path`] - path parameters with detailed rejection messages
//! - [`FileName`] - a validated object name taken from the route
//! - [`RequestContext`] - a fresh deadline and cancellation token per request
//!
//! [`handler::Error`]: crate::handler::Error
//! [`RequestContext`]: crate::service::RequestContext

mod file_name;
mod path;
mod request_context;

pub use crate::extract::file_name::FileName;
pub use crate::extract::path::Path;
