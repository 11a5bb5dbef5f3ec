//! Range-aware file download handlers.
//!
//! `HEAD` reports the object size, `GET` streams a single byte range as
//! `206 Partial Content`, gzip-encoded when the client accepts it and the
//! range is worth compressing.

use std::io;

use async_compression::tokio::bufread::GzipEncoder;
use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::routing::get;
use bytes::Bytes;
use futures::Stream;
use streamer_storage::SharedGateway;
use tokio_util::io::{ReaderStream, StreamReader};

use crate::extract::FileName;
use crate::handler::{ErrorKind, Result};
use crate::service::{CompressionPolicy, RequestContext, ServiceState, accepts_gzip, range};

/// Tracing target for file operations.
const TRACING_TARGET: &str = "streamer_server::handler::files";

/// Reports the size of a file without transferring it.
#[tracing::instrument(skip_all, fields(file_name = %file_name))]
async fn head_file(
    file_name: FileName,
    State(gateway): State<SharedGateway>,
    context: RequestContext,
) -> Result<(StatusCode, HeaderMap)> {
    let metadata = context.run(gateway.metadata(&file_name)).await??;

    tracing::debug!(
        target: TRACING_TARGET,
        size = metadata.size,
        "File metadata retrieved"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.size));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    Ok((StatusCode::OK, headers))
}

/// Streams a byte range of a file.
#[tracing::instrument(skip_all, fields(file_name = %file_name))]
async fn get_file(
    file_name: FileName,
    State(gateway): State<SharedGateway>,
    State(compression_policy): State<CompressionPolicy>,
    context: RequestContext,
    request_headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap, Body)> {
    let metadata = context.run(gateway.metadata(&file_name)).await??;

    let range_header = request_headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let resolved = range::resolve(range_header, metadata.size);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&file_name));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    // An empty object has no satisfiable byte, so no storage read either.
    let Some(byte_range) = resolved.range else {
        tracing::debug!(target: TRACING_TARGET, "Serving empty file");

        headers.insert(header::CONTENT_RANGE, HeaderValue::from_static("bytes */0"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(0u64));
        return Ok((StatusCode::PARTIAL_CONTENT, headers, Body::empty()));
    };

    if resolved.fallback && !range_header.is_empty() {
        tracing::debug!(
            target: TRACING_TARGET,
            range = %range_header,
            size = metadata.size,
            "Unusable range header, serving whole file"
        );
    }

    let stream = context
        .run(gateway.read_range(&file_name, byte_range))
        .await??;

    let content_range = HeaderValue::try_from(byte_range.content_range(metadata.size))
        .map_err(|_| ErrorKind::InternalServerError.with_message("Invalid content range"))?;
    headers.insert(header::CONTENT_RANGE, content_range);

    let compress = compression_policy.should_compress(
        accepts_gzip(&request_headers),
        &file_name,
        byte_range.len(),
    );

    tracing::info!(
        target: TRACING_TARGET,
        range = %byte_range,
        size = metadata.size,
        compress,
        "Streaming file"
    );

    let body = context.guard_stream(stream);
    let body = if compress {
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(header::VARY, HeaderValue::from_static("accept-encoding"));
        Body::from_stream(gzip(body))
    } else {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(byte_range.len()));
        Body::from_stream(body)
    };

    Ok((StatusCode::PARTIAL_CONTENT, headers, body))
}

/// Gzip-encodes a byte stream without buffering it whole.
fn gzip<S>(stream: S) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let reader = StreamReader::new(Box::pin(stream));
    ReaderStream::new(GzipEncoder::new(reader))
}

/// Builds `attachment; filename="..."`, escaping quotes and backslashes.
fn content_disposition(file_name: &str) -> HeaderValue {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    let value = format!("attachment; filename=\"{escaped}\"");

    HeaderValue::from_bytes(value.as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Returns a [`Router`] with all related routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/file/{file_name}", get(get_file).head(head_file))
}
