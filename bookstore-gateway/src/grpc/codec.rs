//! # Dynamic Protobuf Codec
//!
//! This module implements `tonic::codec::Codec` for `prost_reflect::DynamicMessage`, so that
//! `tonic` can transport messages whose types are only known at runtime through a
//! `MessageDescriptor`.
//!
//! ## How it works
//!
//! 1. **Encoder**: the gateway has already decoded and validated the HTTP body into a
//!    `DynamicMessage` of the method's input type, so encoding cannot fail.
//! 2. **Decoder**: reads raw bytes from the wire and merges them into an empty `DynamicMessage`
//!    built from the method's output descriptor.
//!
//! JSON handling lives in the gateway, not here, which keeps the codec usable for any caller
//! that already holds dynamic messages.
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A Codec that moves `DynamicMessage`s over the wire.
///
/// Only the response schema is needed: request messages carry their own descriptor.
pub struct DynamicCodec {
    res_desc: MessageDescriptor,
}

impl DynamicCodec {
    /// Creates a codec that decodes responses as `res_desc` messages.
    pub fn new(res_desc: MessageDescriptor) -> Self {
        Self { res_desc }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;

    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.res_desc.clone())
    }
}

/// Responsible for encoding a dynamic message into Protobuf bytes.
pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode_raw(dst);
        Ok(())
    }
}

/// Responsible for decoding Protobuf bytes into a dynamic message.
pub struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut msg = DynamicMessage::new(self.0.clone());
        msg.merge(src)
            .map_err(|e| Status::internal(format!("Failed to decode Protobuf bytes: {}", e)))?;

        Ok(Some(msg))
    }
}
