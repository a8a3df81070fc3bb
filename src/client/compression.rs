//! Compression codec selection.
//!
//! The supported set is closed: `{none, gzip, snappy, snappy-block, zstd}`.
//! Names are validated when the client configuration is validated, so an
//! unrecognized codec never reaches the network layer. Payloads are
//! compressed after protobuf serialization and decompressed before
//! deserialization (see `client::codec`).

use crate::core::error::{QuiverError, QuiverResult};
use std::io::{Read, Write};
use std::str::FromStr;

/// Compression applied to serialized RPC payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No compression.
    #[default]
    None,
    /// gzip (DEFLATE) framing.
    Gzip,
    /// Snappy stream framing.
    Snappy,
    /// Raw snappy block format, no framing.
    SnappyBlock,
    /// Zstandard at the default level.
    Zstd,
}

impl Compression {
    /// Canonical configuration name for this codec.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => "gzip",
            Self::Snappy => "snappy",
            Self::SnappyBlock => "snappy-block",
            Self::Zstd => "zstd",
        }
    }

    /// Compress a serialized payload.
    pub fn compress(&self, raw: &[u8]) -> QuiverResult<Vec<u8>> {
        match self {
            Self::None => Ok(raw.to_vec()),
            Self::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(raw).map_err(compression_error)?;
                encoder.finish().map_err(compression_error)
            }
            Self::Snappy => {
                let mut encoder = snap::write::FrameEncoder::new(Vec::new());
                encoder.write_all(raw).map_err(compression_error)?;
                encoder
                    .into_inner()
                    .map_err(|err| compression_error(err.error()))
            }
            Self::SnappyBlock => snap::raw::Encoder::new()
                .compress_vec(raw)
                .map_err(compression_error),
            Self::Zstd => zstd::stream::encode_all(raw, 0).map_err(compression_error),
        }
    }

    /// Decompress a received payload.
    pub fn decompress(&self, compressed: &[u8]) -> QuiverResult<Vec<u8>> {
        match self {
            Self::None => Ok(compressed.to_vec()),
            Self::Gzip => {
                let mut decoder = flate2::read::GzDecoder::new(compressed);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).map_err(compression_error)?;
                Ok(out)
            }
            Self::Snappy => {
                let mut decoder = snap::read::FrameDecoder::new(compressed);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).map_err(compression_error)?;
                Ok(out)
            }
            Self::SnappyBlock => snap::raw::Decoder::new()
                .decompress_vec(compressed)
                .map_err(compression_error),
            Self::Zstd => zstd::stream::decode_all(compressed).map_err(compression_error),
        }
    }
}

impl FromStr for Compression {
    type Err = QuiverError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "" | "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "snappy" => Ok(Self::Snappy),
            "snappy-block" => Ok(Self::SnappyBlock),
            "zstd" => Ok(Self::Zstd),
            other => Err(QuiverError::UnsupportedCompression {
                name: other.to_string(),
            }),
        }
    }
}

fn compression_error(err: impl ToString) -> QuiverError {
    QuiverError::Compression {
        message: err.to_string(),
    }
}
