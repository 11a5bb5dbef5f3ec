//! JSON messages of `transfer.v1.TransferService`.
//!
//! Field names follow the protobuf JSON mapping: camelCase names, 64-bit
//! integers as decimal strings, bytes as standard base64.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::rpc::ConnectError;

/// Request of `GetFileSize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileSizeRequest {
    /// Name of the object.
    #[serde(default)]
    pub file_name: String,
}

/// Response of `GetFileSize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileSizeResponse {
    /// Object size in bytes.
    #[serde(with = "int64")]
    pub size: u64,
}

/// Request of `StreamFile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFileRequest {
    /// Name of the object.
    #[serde(default)]
    pub file_name: String,
}

/// One message of the `StreamFile` response stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamFileResponse {
    /// Next slice of the object.
    #[serde(with = "base64_bytes")]
    pub chunk: Bytes,
}

/// One message of the `UploadFile` request stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    /// Name of the object being written.
    #[serde(default)]
    pub file_name: String,
    /// Next slice of the object.
    #[serde(default, with = "base64_bytes")]
    pub chunk: Bytes,
}

/// Acknowledgement sent on the `UploadFile` response stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    /// Name of the object written.
    pub file_name: String,
    /// Bytes received so far.
    #[serde(with = "int64")]
    pub size: u64,
}

/// Payload of the end-of-stream envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndStream {
    /// Set when the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ConnectError>,
}

impl EndStream {
    /// Successful end of stream.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Failed end of stream.
    pub fn error(error: ConnectError) -> Self {
        Self { error: Some(error) }
    }
}

mod int64 {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(D::Error::custom),
            Repr::Number(number) => Ok(number),
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text)
            .map(Bytes::from)
            .map_err(D::Error::custom)
    }
}
