//! Per-stream compression planning.
//!
//! Once a column is decomposed every physical stream is compressed on its own.
//! The planner walks the stream tree of a type and picks one [`StreamCodec`]
//! per stream name: generic zstd for everything, preceded by a byte-plane
//! shuffle for fixed-width value streams when the path allows content-aware
//! compression. Structural streams (null maps, sizes, dictionary indexes)
//! always get the generic codec.

use crate::config::TambakConfig;
use crate::error::TambakError;
use crate::kernels::{shuffle, zstd};
use crate::serialization::{file_name_for_stream, is_special_compression_allowed, SubstreamPath};
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The codec of each physical stream of a column, keyed by stream name.
pub type CodecPlan = BTreeMap<String, StreamCodec>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StreamCodec {
    /// Generic zstd over the raw stream bytes.
    Zstd { level: i32 },
    /// Byte-plane shuffle of `width`-byte values, then zstd.
    ShuffleZstd { width: usize, level: i32 },
}

impl StreamCodec {
    pub fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, TambakError> {
        match *self {
            StreamCodec::Zstd { level } => zstd::encode(bytes, level),
            StreamCodec::ShuffleZstd { width, level } => {
                let shuffled = shuffle_aligned(bytes, width, shuffle::encode)?;
                zstd::encode(&shuffled, level)
            }
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, TambakError> {
        match *self {
            StreamCodec::Zstd { .. } => zstd::decode(bytes),
            StreamCodec::ShuffleZstd { width, .. } => {
                let shuffled = zstd::decode(bytes)?;
                shuffle_aligned(&shuffled, width, shuffle::decode)
            }
        }
    }
}

/// Applies a shuffle kernel to the longest whole-value prefix and copies the
/// remaining tail bytes unchanged. Streams with framing headers are not always
/// a multiple of the value width.
fn shuffle_aligned(
    bytes: &[u8],
    width: usize,
    kernel: fn(&[u8], usize, &mut Vec<u8>) -> Result<(), TambakError>,
) -> Result<Vec<u8>, TambakError> {
    if width == 0 {
        return Err(TambakError::BufferMismatch(width, bytes.len()));
    }
    let aligned = bytes.len() - bytes.len() % width;
    let mut out = Vec::with_capacity(bytes.len());
    kernel(&bytes[..aligned], width, &mut out)?;
    out.extend_from_slice(&bytes[aligned..]);
    Ok(out)
}

/// Picks the codec of every stream the column `name` of `data_type` is
/// decomposed into.
pub fn plan_stream_codecs(
    name: &str,
    data_type: &DataType,
    config: &TambakConfig,
) -> Result<CodecPlan, TambakError> {
    let level = config.profile.zstd_level();
    let serialization = data_type.default_serialization()?;
    let mut plan = CodecPlan::new();

    let mut callback = |path: &SubstreamPath| {
        let width = path
            .last()
            .and_then(|step| step.data.data_type.as_ref())
            .and_then(DataType::fixed_width);
        let codec = match width {
            Some(width)
                if width > 1
                    && config.enable_special_compression
                    && is_special_compression_allowed(path) =>
            {
                StreamCodec::ShuffleZstd { width, level }
            }
            _ => StreamCodec::Zstd { level },
        };
        let stream = file_name_for_stream(name, path);
        log::debug!("planned {:?} for stream {}", codec, stream);
        plan.insert(stream, codec);
    };
    serialization.enumerate_streams(&mut SubstreamPath::new(), &mut callback, Some(data_type), None);

    log_metric!("event"="plan_stream_codecs", "column"=name, "streams"=plan.len());
    Ok(plan)
}
