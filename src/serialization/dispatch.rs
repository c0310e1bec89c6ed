//! Leaf behavior shared by every single-stream type.

use super::cache::{add_to_substreams_cache, get_from_substreams_cache};
use super::{
    DeserializeBinaryBulkSettings, Serialization, SerializationPtr, SerializeBinaryBulkSettings,
    Substream, SubstreamData, SubstreamPath, SubstreamType, SubstreamsCache,
};
use crate::column::{Column, ColumnPtr};
use crate::error::TambakError;
use crate::types::DataType;
use std::ops::Range;
use std::sync::Arc;

/// The rows selected by `offset` and `limit` in a column of `len` rows.
/// `limit == 0` selects everything from `offset` on; both ends are clamped.
pub fn effective_range(len: usize, offset: usize, limit: usize) -> Range<usize> {
    let start = offset.min(len);
    let end = if limit == 0 {
        len
    } else {
        offset.saturating_add(limit).min(len)
    };
    start..end
}

pub(super) fn enumerate_leaf(
    serialization: &SerializationPtr,
    path: &mut SubstreamPath,
    callback: &mut dyn FnMut(&SubstreamPath),
    data_type: Option<&DataType>,
    column: Option<&ColumnPtr>,
) {
    let data = SubstreamData::new(Arc::clone(serialization))
        .with_type(data_type.cloned())
        .with_column(column.cloned());
    path.push(Substream::new(SubstreamType::Regular).with_data(data));
    callback(path);
    path.pop();
}

pub(super) fn serialize_leaf(
    serialization: &Serialization,
    column: &Column,
    offset: usize,
    limit: usize,
    settings: &mut SerializeBinaryBulkSettings<'_>,
) -> Result<(), TambakError> {
    match settings.getter.output_stream(&settings.path) {
        Some(stream) => serialization.serialize_binary_bulk(column, stream, offset, limit),
        None => {
            log::trace!("no output stream for {}, skipping", settings.path);
            Ok(())
        }
    }
}

pub(super) fn deserialize_leaf(
    serialization: &Serialization,
    column: &mut ColumnPtr,
    limit: usize,
    settings: &mut DeserializeBinaryBulkSettings<'_>,
    mut cache: Option<&mut SubstreamsCache>,
) -> Result<(), TambakError> {
    if let Some(cached) = get_from_substreams_cache(cache.as_deref(), &settings.path) {
        log::trace!("substream cache hit for {}", settings.path);
        *column = cached;
        return Ok(());
    }

    let hint = settings.avg_value_size_hint;
    match settings.getter.input_stream(&settings.path) {
        Some(stream) => {
            let rows = serialization.deserialize_binary_bulk(Arc::make_mut(column), stream, limit, hint)?;
            log::trace!("read {} rows from {}", rows, settings.path);
            add_to_substreams_cache(cache.as_deref_mut(), &settings.path, Arc::clone(column));
        }
        None => log::trace!("no input stream for {}, leaving column unchanged", settings.path),
    }
    Ok(())
}
