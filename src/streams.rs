//! In-memory stream storage for one column.
//!
//! [`MemoryStreamStore`] backs both stream-getter capabilities with one growable
//! buffer per physical stream name. Write a column into it, [`rewind`] it and
//! read the column back. [`ColumnStreams`] is the compressed, self-describing
//! form of a store: its streams after the codec plan has been applied.
//!
//! [`rewind`]: MemoryStreamStore::rewind

use crate::codec::CodecPlan;
use crate::error::TambakError;
use crate::serialization::{
    file_name_for_stream, InputStreamGetter, OutputStreamGetter, SubstreamPath,
};
use crate::types::DataType;
use hashbrown::HashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

//==================================================================================
// 1. MemoryStreamStore
//==================================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStreamStore {
    name: String,
    streams: BTreeMap<String, Cursor<Vec<u8>>>,
    skipped: HashSet<String>,
    requested: Vec<String>,
}

impl MemoryStreamStore {
    /// An empty store for the column stored as `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A store holding the given streams, positioned for reading.
    pub fn from_streams(name: impl Into<String>, streams: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            streams: streams
                .into_iter()
                .map(|(stream, bytes)| (stream, Cursor::new(bytes)))
                .collect(),
            ..Self::default()
        }
    }

    /// Declines the named streams in both directions, as a destination that
    /// does not want a subtree would.
    pub fn with_skipped_streams<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.skipped.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Moves every read position back to the start of its stream and forgets
    /// which streams were requested so far.
    pub fn rewind(&mut self) {
        for cursor in self.streams.values_mut() {
            cursor.set_position(0);
        }
        self.requested.clear();
    }

    pub fn stream(&self, name: &str) -> Option<&[u8]> {
        self.streams.get(name).map(|c| c.get_ref().as_slice())
    }

    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.keys().map(String::as_str).collect()
    }

    /// Removes a stream so that later requests for it are declined.
    pub fn remove_stream(&mut self, name: &str) -> Option<Vec<u8>> {
        self.streams.remove(name).map(Cursor::into_inner)
    }

    /// Stream names in the order the getter was asked for them.
    pub fn requested_streams(&self) -> &[String] {
        &self.requested
    }

    /// True once every stream has been read to its end.
    pub fn is_exhausted(&self) -> bool {
        self.streams
            .values()
            .all(|c| c.position() as usize == c.get_ref().len())
    }

    pub fn total_bytes(&self) -> usize {
        self.streams.values().map(|c| c.get_ref().len()).sum()
    }

    fn resolve(&mut self, path: &SubstreamPath) -> Option<String> {
        let stream = file_name_for_stream(&self.name, path);
        self.requested.push(stream.clone());
        if self.skipped.contains(&stream) {
            log::trace!("stream {} declined", stream);
            return None;
        }
        Some(stream)
    }

    /// Compresses every stream with the codec `plan` assigns to it. `rows` were
    /// written in bulk calls of `granule_rows` rows each.
    pub fn compress(
        &self,
        data_type: &DataType,
        rows: u64,
        granule_rows: usize,
        plan: &CodecPlan,
    ) -> Result<ColumnStreams, TambakError> {
        let mut streams = BTreeMap::new();
        for (name, cursor) in &self.streams {
            let codec = plan.get(name).ok_or_else(|| {
                TambakError::InternalError(format!("no codec planned for stream {}", name))
            })?;
            let compressed = codec.encode(cursor.get_ref())?;
            log::debug!(
                "stream {}: {} -> {} bytes",
                name,
                cursor.get_ref().len(),
                compressed.len()
            );
            streams.insert(name.clone(), compressed);
        }
        Ok(ColumnStreams {
            name: self.name.clone(),
            data_type: data_type.clone(),
            rows,
            granule_rows,
            codecs: plan.clone(),
            streams,
        })
    }

    /// Decompresses `column` into a store positioned for reading.
    pub fn decompress(column: &ColumnStreams) -> Result<Self, TambakError> {
        let mut streams = BTreeMap::new();
        for (name, bytes) in &column.streams {
            let codec = column.codecs.get(name).ok_or_else(|| {
                TambakError::CorruptedStream(format!("stream {} has no codec in the plan", name))
            })?;
            streams.insert(name.clone(), codec.decode(bytes)?);
        }
        Ok(Self::from_streams(column.name.clone(), streams))
    }
}

impl OutputStreamGetter for MemoryStreamStore {
    fn output_stream(&mut self, path: &SubstreamPath) -> Option<&mut dyn Write> {
        let stream = self.resolve(path)?;
        let cursor = self.streams.entry(stream).or_default();
        cursor.set_position(cursor.get_ref().len() as u64);
        Some(cursor as &mut dyn Write)
    }
}

impl InputStreamGetter for MemoryStreamStore {
    fn input_stream(&mut self, path: &SubstreamPath) -> Option<&mut dyn Read> {
        let stream = self.resolve(path)?;
        self.streams
            .get_mut(&stream)
            .map(|cursor| cursor as &mut dyn Read)
    }
}

//==================================================================================
// 2. ColumnStreams
//==================================================================================

/// The compressed streams of one column together with what is needed to read
/// them back.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStreams {
    pub name: String,
    pub data_type: DataType,
    pub rows: u64,
    /// Rows per bulk call the streams were written with. Readers default to
    /// the same granules.
    pub granule_rows: usize,
    pub codecs: CodecPlan,
    pub streams: BTreeMap<String, Vec<u8>>,
}

#[derive(Serialize)]
struct StreamManifestEntry<'a> {
    name: &'a str,
    compressed_bytes: usize,
    codec: Option<&'a crate::codec::StreamCodec>,
}

#[derive(Serialize)]
struct ColumnManifest<'a> {
    column: &'a str,
    data_type: String,
    rows: u64,
    granule_rows: usize,
    streams: Vec<StreamManifestEntry<'a>>,
}

impl ColumnStreams {
    pub fn compressed_size(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }

    /// A JSON description of the column and its streams, for diagnostics.
    pub fn manifest_json(&self) -> Result<String, TambakError> {
        let manifest = ColumnManifest {
            column: &self.name,
            data_type: self.data_type.to_string(),
            rows: self.rows,
            granule_rows: self.granule_rows,
            streams: self
                .streams
                .iter()
                .map(|(name, bytes)| StreamManifestEntry {
                    name,
                    compressed_bytes: bytes.len(),
                    codec: self.codecs.get(name),
                })
                .collect(),
        };
        Ok(serde_json::to_string(&manifest)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StreamCodec;
    use crate::serialization::{Substream, SubstreamType};

    fn sizes_path() -> SubstreamPath {
        vec![Substream::new(SubstreamType::ArraySizes)].into()
    }

    #[test]
    fn test_writes_append_and_rewind_reads_from_start() {
        let mut store = MemoryStreamStore::new("m");
        let path = sizes_path();
        store.output_stream(&path).unwrap().write_all(b"ab").unwrap();
        store.output_stream(&path).unwrap().write_all(b"cd").unwrap();
        assert_eq!(store.stream("m.size0"), Some(&b"abcd"[..]));

        store.rewind();
        let mut buf = Vec::new();
        store.input_stream(&path).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"abcd");
        assert!(store.is_exhausted());
    }

    #[test]
    fn test_skipped_streams_are_declined_and_logged() {
        let mut store = MemoryStreamStore::new("m").with_skipped_streams(["m.size0"]);
        assert!(store.output_stream(&sizes_path()).is_none());
        assert!(store.stream_names().is_empty());
        assert_eq!(store.requested_streams(), &["m.size0".to_string()]);
    }

    #[test]
    fn test_rewind_forgets_earlier_requests() {
        let mut store = MemoryStreamStore::new("m");
        store.output_stream(&sizes_path()).unwrap().write_all(b"ab").unwrap();
        assert_eq!(store.requested_streams(), &["m.size0".to_string()]);

        store.rewind();
        assert!(store.requested_streams().is_empty());
        store.input_stream(&sizes_path()).unwrap();
        assert_eq!(store.requested_streams(), &["m.size0".to_string()]);
    }

    #[test]
    fn test_compress_requires_a_planned_codec() {
        let mut store = MemoryStreamStore::new("m");
        store.output_stream(&sizes_path()).unwrap().write_all(&[1, 2, 3]).unwrap();

        let err = store
            .compress(&DataType::array(DataType::UInt8), 1, 8192, &CodecPlan::new())
            .unwrap_err();
        assert!(matches!(err, TambakError::InternalError(_)));

        let mut plan = CodecPlan::new();
        plan.insert("m.size0".to_string(), StreamCodec::Zstd { level: 3 });
        let compressed = store.compress(&DataType::array(DataType::UInt8), 1, 8192, &plan).unwrap();
        let restored = MemoryStreamStore::decompress(&compressed).unwrap();
        assert_eq!(restored.stream("m.size0"), Some(&[1u8, 2, 3][..]));

        let manifest: serde_json::Value =
            serde_json::from_str(&compressed.manifest_json().unwrap()).unwrap();
        assert_eq!(manifest["data_type"], "Array(UInt8)");
        assert_eq!(manifest["granule_rows"], 8192);
        assert_eq!(manifest["streams"][0]["name"], "m.size0");
        assert_eq!(manifest["streams"][0]["codec"]["op"], "zstd");
    }
}
