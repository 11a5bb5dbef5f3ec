//! `transfer.v1.TransferService` handlers.

use std::io;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt, stream};
use serde::de::DeserializeOwned;
use streamer_storage::{ByteRange, SharedGateway};

use crate::extract::FileName;
use crate::rpc::envelope::Envelope;
use crate::rpc::message::{
    EndStream, GetFileSizeRequest, GetFileSizeResponse, StreamFileRequest, StreamFileResponse,
    UploadFileRequest,
};
use crate::rpc::{CONNECT_JSON, ConnectError};
use crate::service::RequestContext;

/// Tracing target for transfer service calls.
const TRACING_TARGET: &str = "streamer_server::rpc::transfer";

/// Largest payload carried by a single `StreamFile` message.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Returns the size of an object.
///
/// Any failure to read the metadata is reported as `not_found`.
#[tracing::instrument(skip_all)]
pub(crate) async fn get_file_size(
    State(gateway): State<SharedGateway>,
    context: RequestContext,
    body: Bytes,
) -> Result<Json<GetFileSizeResponse>, ConnectError> {
    let request: GetFileSizeRequest = serde_json::from_slice(&body)?;
    let file_name = FileName::parse(request.file_name)?;

    let metadata = context
        .run(gateway.metadata(&file_name))
        .await?
        .map_err(|error| {
            tracing::debug!(
                target: TRACING_TARGET,
                file_name = %file_name,
                error = %error,
                "File size unavailable"
            );
            ConnectError::not_found(format!("file {file_name} not found"))
        })?;

    Ok(Json(GetFileSizeResponse {
        size: metadata.size,
    }))
}

/// Streams an object as a sequence of base64 chunks.
#[tracing::instrument(skip_all)]
pub(crate) async fn stream_file(
    State(gateway): State<SharedGateway>,
    context: RequestContext,
    body: Bytes,
) -> Response {
    match open_stream(&gateway, &context, body).await {
        Ok(chunks) => streaming_response(encode_chunks(chunks)),
        Err(error) => {
            tracing::debug!(target: TRACING_TARGET, error = %error, "StreamFile rejected");
            streaming_response(stream::once(async move { end_stream(Some(error)) }))
        }
    }
}

/// Accepts the upload contract without storing anything.
#[tracing::instrument(skip_all)]
pub(crate) async fn upload_file(body: Bytes) -> Response {
    let file_name = Envelope::decode_all(body)
        .ok()
        .and_then(|envelopes| envelopes.into_iter().next())
        .and_then(|first| serde_json::from_slice::<UploadFileRequest>(first.payload()).ok())
        .map(|request| request.file_name)
        .unwrap_or_default();

    tracing::warn!(
        target: TRACING_TARGET,
        file_name = %file_name,
        "UploadFile called but uploads are not supported"
    );

    let error = ConnectError::unimplemented("this method is not implemented");
    streaming_response(stream::once(async move { end_stream(Some(error)) }))
}

/// Decodes the single request message of a server-streaming call.
fn decode_request<T: DeserializeOwned>(body: Bytes) -> Result<T, ConnectError> {
    let envelope = Envelope::decode_all(body)?
        .into_iter()
        .find(|envelope| !envelope.is_end_stream())
        .ok_or_else(|| ConnectError::invalid_argument("missing request message"))?;

    Ok(serde_json::from_slice(envelope.payload())?)
}

async fn open_stream(
    gateway: &SharedGateway,
    context: &RequestContext,
    body: Bytes,
) -> Result<impl Stream<Item = io::Result<Bytes>> + Send + 'static, ConnectError> {
    let request: StreamFileRequest = decode_request(body)?;
    let file_name = FileName::parse(request.file_name)?;

    let metadata = context.run(gateway.metadata(&file_name)).await??;

    let chunks = match ByteRange::full(metadata.size) {
        Some(range) => context
            .run(gateway.read_range(&file_name, range))
            .await??
            .boxed(),
        None => stream::empty().boxed(),
    };

    tracing::info!(
        target: TRACING_TARGET,
        file_name = %file_name,
        size = metadata.size,
        "Streaming file over rpc"
    );

    Ok(context.guard_stream(chunks))
}

/// Turns object bytes into enveloped messages followed by the end of stream.
fn encode_chunks(
    chunks: impl Stream<Item = io::Result<Bytes>> + Send + 'static,
) -> impl Stream<Item = Bytes> + Send + 'static {
    async_stream::stream! {
        let mut chunks = Box::pin(chunks);

        while let Some(next) = chunks.next().await {
            let mut chunk = match next {
                Ok(chunk) => chunk,
                Err(error) => {
                    yield end_stream(Some(error.into()));
                    return;
                }
            };

            while !chunk.is_empty() {
                let piece = chunk.split_to(chunk.len().min(MAX_CHUNK_SIZE));
                match Envelope::json(&StreamFileResponse { chunk: piece }) {
                    Ok(envelope) => yield envelope.encode(),
                    Err(error) => {
                        yield end_stream(Some(ConnectError::internal(error.to_string())));
                        return;
                    }
                }
            }
        }

        yield end_stream(None);
    }
}

/// Encodes the end-of-stream envelope.
fn end_stream(error: Option<ConnectError>) -> Bytes {
    let message = match error {
        Some(error) => EndStream::error(error),
        None => EndStream::ok(),
    };

    // An `EndStream` always serializes; fall back to an empty object anyway.
    let payload = serde_json::to_vec(&message).unwrap_or_else(|_| b"{}".to_vec());
    Envelope::end_stream(payload).encode()
}

fn streaming_response(frames: impl Stream<Item = Bytes> + Send + 'static) -> Response {
    let body = Body::from_stream(frames.map(Ok::<_, io::Error>));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(CONNECT_JSON))],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::test::{CountingGateway, FailingGateway};
    use crate::rpc::Code;
    use crate::rpc::test::create_test_server_with_gateway;

    const GET_FILE_SIZE: &str = "/transfer.v1.TransferService/GetFileSize";
    const STREAM_FILE: &str = "/transfer.v1.TransferService/StreamFile";
    const UPLOAD_FILE: &str = "/transfer.v1.TransferService/UploadFile";

    fn request_body(message: Value) -> Bytes {
        Envelope::message(serde_json::to_vec(&message).unwrap()).encode()
    }

    #[tokio::test]
    async fn get_file_size_returns_size_as_string() -> anyhow::Result<()> {
        let gateway = CountingGateway::seeded([("data.bin", vec![7u8; 1000])]).await?;
        let server = create_test_server_with_gateway(gateway)?;

        let response = server
            .post(GET_FILE_SIZE)
            .json(&json!({ "fileName": "data.bin" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({ "size": "1000" }));
        Ok(())
    }

    #[tokio::test]
    async fn get_file_size_of_missing_file() -> anyhow::Result<()> {
        let gateway = CountingGateway::seeded([("data.bin", vec![0u8; 10])]).await?;
        let server = create_test_server_with_gateway(gateway)?;

        let response = server
            .post(GET_FILE_SIZE)
            .json(&json!({ "fileName": "absent.bin" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        let error = response.json::<ConnectError>();
        assert_eq!(error.code(), Code::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn get_file_size_reports_backend_failure_as_not_found() -> anyhow::Result<()> {
        let server = create_test_server_with_gateway(FailingGateway::unreachable())?;

        let response = server
            .post(GET_FILE_SIZE)
            .json(&json!({ "fileName": "data.bin" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ConnectError>().code(), Code::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn get_file_size_rejects_traversal() -> anyhow::Result<()> {
        let gateway = CountingGateway::seeded([("data.bin", vec![0u8; 10])]).await?;
        let server = create_test_server_with_gateway(gateway.clone())?;

        let response = server
            .post(GET_FILE_SIZE)
            .json(&json!({ "fileName": "../data.bin" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ConnectError>().code(), Code::InvalidArgument);
        assert_eq!(gateway.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn get_file_size_rejects_malformed_json() -> anyhow::Result<()> {
        let gateway = CountingGateway::seeded([("data.bin", vec![0u8; 10])]).await?;
        let server = create_test_server_with_gateway(gateway)?;

        let response = server
            .post(GET_FILE_SIZE)
            .bytes(Bytes::from_static(b"not json"))
            .content_type("application/json")
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn stream_file_sends_whole_object() -> anyhow::Result<()> {
        let data: Vec<u8> = (0..150_000).map(|i| (i % 253) as u8).collect();
        let gateway = CountingGateway::seeded([("big.bin", data.clone())]).await?;
        let server = create_test_server_with_gateway(gateway)?;

        let response = server
            .post(STREAM_FILE)
            .bytes(request_body(json!({ "fileName": "big.bin" })))
            .content_type(CONNECT_JSON)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CONNECT_JSON);

        let envelopes = Envelope::decode_all(Bytes::copy_from_slice(response.as_bytes()))?;
        let (last, messages) = envelopes.split_last().expect("end of stream");
        assert!(last.is_end_stream());
        assert_eq!(serde_json::from_slice::<Value>(last.payload())?, json!({}));
        assert!(messages.len() >= 3);

        let mut received = BytesMut::new();
        for envelope in messages {
            assert!(!envelope.is_end_stream());
            let message: StreamFileResponse = serde_json::from_slice(envelope.payload())?;
            assert!(message.chunk.len() <= MAX_CHUNK_SIZE);
            received.extend_from_slice(&message.chunk);
        }
        assert_eq!(&received[..], data.as_slice());
        Ok(())
    }

    #[tokio::test]
    async fn stream_file_of_missing_file_ends_with_error() -> anyhow::Result<()> {
        let gateway = CountingGateway::seeded([("data.bin", vec![0u8; 10])]).await?;
        let server = create_test_server_with_gateway(gateway)?;

        let response = server
            .post(STREAM_FILE)
            .bytes(request_body(json!({ "fileName": "absent.bin" })))
            .content_type(CONNECT_JSON)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let envelopes = Envelope::decode_all(Bytes::copy_from_slice(response.as_bytes()))?;
        assert_eq!(envelopes.len(), 1);
        assert!(envelopes[0].is_end_stream());

        let end: EndStream = serde_json::from_slice(envelopes[0].payload())?;
        assert_eq!(end.error.map(|error| error.code()), Some(Code::NotFound));
        Ok(())
    }

    #[tokio::test]
    async fn stream_file_read_failure_ends_with_internal_error() -> anyhow::Result<()> {
        let server = create_test_server_with_gateway(FailingGateway::unreadable(1000))?;

        let response = server
            .post(STREAM_FILE)
            .bytes(request_body(json!({ "fileName": "data.bin" })))
            .content_type(CONNECT_JSON)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let envelopes = Envelope::decode_all(Bytes::copy_from_slice(response.as_bytes()))?;
        assert_eq!(envelopes.len(), 1);
        assert!(envelopes[0].is_end_stream());

        let end: EndStream = serde_json::from_slice(envelopes[0].payload())?;
        assert_eq!(end.error.map(|error| error.code()), Some(Code::Internal));
        Ok(())
    }

    #[tokio::test]
    async fn stream_file_of_empty_file() -> anyhow::Result<()> {
        let gateway = CountingGateway::seeded([("empty.bin", Vec::new())]).await?;
        let server = create_test_server_with_gateway(gateway.clone())?;

        let response = server
            .post(STREAM_FILE)
            .bytes(request_body(json!({ "fileName": "empty.bin" })))
            .content_type(CONNECT_JSON)
            .await;

        let envelopes = Envelope::decode_all(Bytes::copy_from_slice(response.as_bytes()))?;
        assert_eq!(envelopes.len(), 1);
        assert!(envelopes[0].is_end_stream());
        assert_eq!(gateway.reads(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn upload_file_is_unimplemented() -> anyhow::Result<()> {
        let gateway = CountingGateway::seeded(Vec::<(&str, Vec<u8>)>::new()).await?;
        let server = create_test_server_with_gateway(gateway.clone())?;

        let response = server
            .post(UPLOAD_FILE)
            .bytes(request_body(json!({ "fileName": "new.bin", "chunk": "aGk=" })))
            .content_type(CONNECT_JSON)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let envelopes = Envelope::decode_all(Bytes::copy_from_slice(response.as_bytes()))?;
        let end: EndStream = serde_json::from_slice(envelopes[0].payload())?;
        assert_eq!(end.error.map(|error| error.code()), Some(Code::Unimplemented));
        assert_eq!(gateway.calls(), 0);
        Ok(())
    }
}
