//! # Dynamic gRPC Client
//!
//! This module wraps a standard `tonic` client to provide a generic interface for
//! unary gRPC calls. It is agnostic to the specific Protobuf messages being exchanged.
//!
//! ## How it works
//!
//! The [`GrpcClient`] utilizes the [`super::codec::DynamicCodec`] to handle serialization.
//! It builds the HTTP/2 path (e.g. `/bookstore.Echo/Echo`) from the `MethodDescriptor`
//! at runtime and converts forwarded headers into Tonic's `MetadataMap`.
//!
//! The underlying service is generic: in production it is a [`Channel`] to the loopback
//! RPC listener, in tests it can be any tonic server used directly as a `GrpcService`.
use super::codec::DynamicCodec;
use crate::BoxError;
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
};
use http_body::Body as HttpBody;
use prost_reflect::{DynamicMessage, MethodDescriptor};
use std::str::FromStr;
use tonic::{
    client::GrpcService,
    metadata::{
        AsciiMetadataKey, AsciiMetadataValue, BinaryMetadataKey, BinaryMetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
    transport::Channel,
};

#[derive(thiserror::Error, Debug)]
pub enum GrpcRequestError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
    #[error("Binary metadata value for key '{key}' is not base64: '{source}'")]
    InvalidBinaryMetadataValue {
        key: String,
        source: base64::DecodeError,
    },
}

/// A generic client performing unary calls with dynamic messages.
#[derive(Debug, Clone)]
pub struct GrpcClient<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl<S> GrpcClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }

    /// Performs a Unary gRPC call (Single Request -> Single Response).
    ///
    /// # Returns
    /// * `Ok(Ok(DynamicMessage))` - Successful RPC execution.
    /// * `Ok(Err(Status))` - RPC executed, but server returned an error.
    /// * `Err(GrpcRequestError)` - Failed to send request or connect.
    pub async fn unary(
        &mut self,
        method: &MethodDescriptor,
        payload: DynamicMessage,
        metadata: Vec<(String, String)>,
    ) -> Result<Result<DynamicMessage, tonic::Status>, GrpcRequestError> {
        let request = build_request(payload, metadata)?;

        self.client
            .ready()
            .await
            .map_err(|e| GrpcRequestError::ClientNotReady(e.into()))?;

        let codec = DynamicCodec::new(method.output());
        let path = http_path(method);

        match self.client.unary(request, path, codec).await {
            Ok(response) => Ok(Ok(response.into_inner())),
            Err(status) => Ok(Err(status)),
        }
    }
}

fn http_path(method: &MethodDescriptor) -> http::uri::PathAndQuery {
    let path = format!("/{}/{}", method.parent_service().full_name(), method.name());
    http::uri::PathAndQuery::from_str(&path).expect("valid gRPC path")
}

fn build_request<T>(
    payload: T,
    metadata: Vec<(String, String)>,
) -> Result<tonic::Request<T>, GrpcRequestError> {
    let mut request = tonic::Request::new(payload);
    for (k, v) in metadata {
        if k.ends_with("-bin") {
            let key = BinaryMetadataKey::from_str(&k).map_err(|source| {
                GrpcRequestError::InvalidMetadataKey {
                    key: k.clone(),
                    source,
                }
            })?;
            let bytes = decode_binary(&v).map_err(|source| {
                GrpcRequestError::InvalidBinaryMetadataValue { key: k, source }
            })?;
            request
                .metadata_mut()
                .append_bin(key, BinaryMetadataValue::from_bytes(&bytes));
        } else {
            let key = AsciiMetadataKey::from_str(&k).map_err(|source| {
                GrpcRequestError::InvalidMetadataKey {
                    key: k.clone(),
                    source,
                }
            })?;
            let val = AsciiMetadataValue::from_str(&v)
                .map_err(|source| GrpcRequestError::InvalidMetadataValue { key: k, source })?;
            request.metadata_mut().append(key, val);
        }
    }
    Ok(request)
}

/// `-bin` header values arrive base64 encoded, padded or not.
fn decode_binary(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD
        .decode(value)
        .or_else(|_| STANDARD_NO_PAD.decode(value))
}
