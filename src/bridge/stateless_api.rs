// In: src/bridge/stateless_api.rs

use arrow::array::{Array, ArrayRef};
use std::sync::Arc;

use crate::bridge::arrow_impl;
use crate::codec::plan_stream_codecs;
use crate::column::Column;
use crate::config::TambakConfig;
use crate::error::TambakError;
use crate::serialization::{
    DeserializeBinaryBulkSettings, SerializeBinaryBulkSettings, SubstreamsCache,
};
use crate::streams::{ColumnStreams, MemoryStreamStore};
use crate::types::DataType;

/// The engine type of a top-level Arrow array. Arrays carrying a validity
/// buffer are `Nullable` when their values may be.
pub fn arrow_column_type(array: &dyn Array) -> Result<DataType, TambakError> {
    let data_type = DataType::from_arrow_type(array.data_type())?;
    if array.nulls().is_some() && data_type.can_be_inside_nullable() {
        Ok(DataType::nullable(data_type))
    } else {
        Ok(data_type)
    }
}

/// Decomposes an Arrow array into the compressed streams of the column `name`.
///
/// The column is written in bulk calls of `config.granule_rows` rows, and every
/// stream is compressed with the codec the planner picks for it.
pub fn serialize_arrow_column(
    name: &str,
    array: &dyn Array,
    config: &TambakConfig,
) -> Result<ColumnStreams, TambakError> {
    // 1. Marshall the data from the Arrow world into an engine column.
    let data_type = arrow_column_type(array)?;
    let column = arrow_impl::array_to_column(array, &data_type)?;
    let serialization = data_type.default_serialization()?;

    // 2. Decompose the column granule by granule.
    let granule_rows = config.granule_rows.max(1);
    let mut store = MemoryStreamStore::new(name);
    let mut offset = 0;
    while offset < column.len() {
        let mut settings = SerializeBinaryBulkSettings::new(&mut store);
        serialization.serialize_binary_bulk_with_multiple_streams(
            &column,
            offset,
            granule_rows,
            &mut settings,
        )?;
        offset += granule_rows;
    }

    // 3. Compress every stream with its planned codec.
    let plan = plan_stream_codecs(name, &data_type, config)?;
    let streams = store.compress(&data_type, column.len() as u64, granule_rows, &plan)?;

    log_metric!(
        "event"="serialize_arrow_column",
        "column"=name,
        "type"=&data_type,
        "rows"=column.len(),
        "raw_bytes"=store.total_bytes(),
        "compressed_bytes"=streams.compressed_size()
    );
    Ok(streams)
}

/// Reads the streams produced by [`serialize_arrow_column`] back into an Arrow array.
pub fn deserialize_arrow_column(
    streams: &ColumnStreams,
    config: &TambakConfig,
) -> Result<ArrayRef, TambakError> {
    let data_type = &streams.data_type;
    let serialization = data_type.default_serialization()?;
    let mut store = MemoryStreamStore::decompress(streams)?;

    let total_rows = streams.rows as usize;
    let granule_rows = streams.granule_rows.max(1);
    let mut column = Arc::new(Column::empty(data_type));
    // Shared by every granule; a split dictionary block resumes in the next call.
    let mut settings = DeserializeBinaryBulkSettings::new(&mut store)
        .with_avg_value_size_hint(config.avg_value_size_hint);
    while column.len() < total_rows {
        let before = column.len();
        let limit = granule_rows.min(total_rows - before);
        // Subcolumns are shared only within one read call.
        let mut cache = SubstreamsCache::new();
        serialization.deserialize_binary_bulk_with_multiple_streams(
            &mut column,
            limit,
            &mut settings,
            Some(&mut cache),
        )?;
        if column.len() != before + limit {
            return Err(TambakError::TruncatedStream {
                column: streams.name.clone(),
            });
        }
    }
    log::debug!(
        "read {} rows of {} ({}) in granules of {}",
        total_rows,
        streams.name,
        data_type,
        granule_rows
    );

    arrow_impl::column_to_array(&column, data_type)
}
