//! gRPC codec over the hand-rolled wire types.
//!
//! tonic is codec-agnostic; this codec serializes the manual prost
//! messages from `model::proto` and applies the configured payload
//! compression in the same step, so every codec in the closed set works
//! uniformly without transport-level negotiation.

use crate::client::compression::Compression;
use bytes::{Buf, BufMut};
use prost::Message;
use std::marker::PhantomData;
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::Status;

/// Codec pairing a request and response message type with a compression
/// setting. `Default` yields the uncompressed codec.
#[derive(Debug)]
pub struct WireCodec<E, D> {
    compression: Compression,
    _marker: PhantomData<fn(E) -> D>,
}

impl<E, D> WireCodec<E, D> {
    /// Create a codec with the given payload compression.
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            _marker: PhantomData,
        }
    }
}

impl<E, D> Default for WireCodec<E, D> {
    fn default() -> Self {
        Self::new(Compression::None)
    }
}

impl<E, D> Codec for WireCodec<E, D>
where
    E: Message + Send + 'static,
    D: Message + Default + Send + 'static,
{
    type Encode = E;
    type Decode = D;
    type Encoder = WireEncoder<E>;
    type Decoder = WireDecoder<D>;

    fn encoder(&mut self) -> Self::Encoder {
        WireEncoder {
            compression: self.compression,
            _marker: PhantomData,
        }
    }

    fn decoder(&mut self) -> Self::Decoder {
        WireDecoder {
            compression: self.compression,
            _marker: PhantomData,
        }
    }
}

/// Serializes and compresses outgoing messages.
#[derive(Debug)]
pub struct WireEncoder<E> {
    compression: Compression,
    _marker: PhantomData<fn(E)>,
}

impl<E: Message> Encoder for WireEncoder<E> {
    type Item = E;
    type Error = Status;

    fn encode(&mut self, item: E, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        let raw = item.encode_to_vec();
        let payload = self
            .compression
            .compress(&raw)
            .map_err(|err| Status::internal(err.to_string()))?;
        dst.put_slice(&payload);
        Ok(())
    }
}

/// Decompresses and deserializes incoming messages.
#[derive(Debug)]
pub struct WireDecoder<D> {
    compression: Compression,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Message + Default> Decoder for WireDecoder<D> {
    type Item = D;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let compressed = src.copy_to_bytes(src.remaining());
        let raw = self
            .compression
            .decompress(&compressed)
            .map_err(|err| Status::internal(err.to_string()))?;
        let message = D::decode(raw.as_slice())
            .map_err(|err| Status::internal(format!("failed to decode response: {err}")))?;
        Ok(Some(message))
    }
}
