//! `Array(T)`: per-row sizes in an `ArraySizes` stream, the flattened elements
//! under `ArrayElements`.

use super::cache::{add_to_substreams_cache, get_from_substreams_cache};
use super::dispatch::effective_range;
use super::policy::get_array_level;
use super::{
    simple, DeserializeBinaryBulkSettings, Serialization, SerializationPtr, SerializeBinaryBulkSettings,
    SubcolumnCreator, Substream, SubstreamData, SubstreamPath, SubstreamType, SubstreamsCache,
};
use crate::column::{
    offsets_to_sizes, sizes_to_offsets, take_column, ArrayColumn, Column, ColumnPtr,
};
use crate::error::TambakError;
use crate::types::DataType;
use std::sync::Arc;

fn as_array(column: &Column) -> Result<&ArrayColumn, TambakError> {
    match column {
        Column::Array(array) => Ok(array),
        other => Err(TambakError::TypeMismatch {
            expected: "Array".to_string(),
            actual: other.name(),
        }),
    }
}

pub(super) fn enumerate_streams(
    nested: &SerializationPtr,
    path: &mut SubstreamPath,
    callback: &mut dyn FnMut(&SubstreamPath),
    data_type: Option<&DataType>,
    column: Option<&ColumnPtr>,
) {
    let nested_type = match data_type {
        Some(DataType::Array(nested_type)) => Some(&**nested_type),
        _ => None,
    };
    let array = column.and_then(|c| as_array(c).ok());

    let elements = SubstreamData::new(Arc::clone(nested))
        .with_type(nested_type.cloned())
        .with_column(array.map(|a| Arc::clone(a.data())))
        .with_creator(SubcolumnCreator::Array {
            offsets: array.map(|a| Arc::clone(a.offsets_column())),
        });
    path.push(Substream::new(SubstreamType::ArrayElements).with_data(elements));
    nested.enumerate_streams(path, callback, nested_type, array.map(|a| a.data()));
    path.pop();

    // Read on its own, the sizes subcolumn must still resolve to `sizeK`.
    let sizes_serialization = Serialization::Named {
        name: format!("size{}", get_array_level(path)),
        escape_delimiter: false,
        nested: Arc::new(Serialization::Simple(DataType::UInt64)),
    };
    let sizes = SubstreamData::new(Arc::new(sizes_serialization))
        .with_type(data_type.map(|_| DataType::UInt64))
        .with_column(array.map(|a| Arc::new(Column::UInt64(offsets_to_sizes(a.offsets())))));
    path.push(Substream::new(SubstreamType::ArraySizes).with_data(sizes));
    callback(path);
    path.pop();
}

pub(super) fn serialize_with_multiple_streams(
    nested: &SerializationPtr,
    column: &Column,
    offset: usize,
    limit: usize,
    settings: &mut SerializeBinaryBulkSettings<'_>,
) -> Result<(), TambakError> {
    let array = as_array(column)?;
    let range = effective_range(array.len(), offset, limit);

    settings.scoped(SubstreamType::ArraySizes, |settings| {
        let Some(stream) = settings.stream() else {
            return Ok(());
        };
        let sizes: Vec<u64> = range
            .clone()
            .map(|row| array.offsets()[row] - array.row_start(row))
            .collect();
        simple::serialize_binary_bulk(&DataType::UInt64, &Column::UInt64(sizes), stream, 0, 0)
    })?;

    let nested_offset = array.row_start(range.start) as usize;
    let nested_end = match range.end {
        0 => 0,
        end => array.offsets()[end - 1] as usize,
    };
    let nested_limit = nested_end.saturating_sub(nested_offset);
    if nested_limit == 0 {
        return Ok(());
    }
    settings.scoped(SubstreamType::ArrayElements, |settings| {
        nested.serialize_binary_bulk_with_multiple_streams(
            array.data(),
            nested_offset,
            nested_limit,
            settings,
        )
    })
}

pub(super) fn deserialize_with_multiple_streams(
    nested: &SerializationPtr,
    column: &mut ColumnPtr,
    limit: usize,
    settings: &mut DeserializeBinaryBulkSettings<'_>,
    mut cache: Option<&mut SubstreamsCache>,
) -> Result<(), TambakError> {
    let (mut offsets, mut data) = match take_column(column) {
        Column::Array(array) => array.into_parts(),
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "Array".to_string(),
                actual: other.name(),
            })
        }
    };

    settings.scoped(SubstreamType::ArraySizes, |settings| -> Result<(), TambakError> {
        if let Some(sizes) = get_from_substreams_cache(cache.as_deref(), &settings.path) {
            log::trace!("substream cache hit for {}", settings.path);
            offsets = Arc::new(Column::UInt64(sizes_to_offsets(0, sizes.as_u64_slice()?)?));
            return Ok(());
        }
        let Some(stream) = settings.stream() else {
            return Ok(());
        };
        let mut sizes = Column::UInt64(Vec::new());
        simple::deserialize_binary_bulk(&DataType::UInt64, &mut sizes, stream, limit, 0.0)?;

        let mut all = match take_column(&mut offsets) {
            Column::UInt64(values) => values,
            other => {
                return Err(TambakError::TypeMismatch {
                    expected: "UInt64".to_string(),
                    actual: other.name(),
                })
            }
        };
        let start = all.last().copied().unwrap_or(0);
        all.extend(sizes_to_offsets(start, sizes.as_u64_slice()?)?);
        let all_sizes = offsets_to_sizes(&all);
        offsets = Arc::new(Column::UInt64(all));
        add_to_substreams_cache(
            cache.as_deref_mut(),
            &settings.path,
            Arc::new(Column::UInt64(all_sizes)),
        );
        Ok(())
    })?;

    let last_offset = offsets.as_u64_slice()?.last().copied().unwrap_or(0) as usize;
    let nested_limit = last_offset.saturating_sub(data.len());
    settings.scoped(SubstreamType::ArrayElements, |settings| {
        nested.deserialize_binary_bulk_with_multiple_streams(&mut data, nested_limit, settings, cache)
    })?;

    *column = Arc::new(Column::Array(ArrayColumn::try_new(offsets, data)?));
    Ok(())
}
