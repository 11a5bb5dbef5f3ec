use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::service::{RequestContext, RequestTimeout};

impl<S> FromRequestParts<S> for RequestContext
where
    RequestTimeout: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequestTimeout(timeout) = RequestTimeout::from_ref(state);
        Ok(Self::new(timeout))
    }
}
