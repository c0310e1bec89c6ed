//! `Nullable(T)`: a `UInt8` null map (1 = null) under `NullMap`, the values
//! under `NullableElements`.

use super::dispatch::deserialize_leaf;
use super::{
    simple, DeserializeBinaryBulkSettings, Serialization, SerializationPtr,
    SerializeBinaryBulkSettings, SubcolumnCreator, Substream, SubstreamData, SubstreamPath,
    SubstreamType, SubstreamsCache,
};
use crate::column::{take_column, Column, ColumnPtr, NullableColumn};
use crate::error::TambakError;
use crate::types::DataType;
use std::sync::Arc;

const NULL_MAP: Serialization = Serialization::Simple(DataType::UInt8);

pub(super) fn enumerate_streams(
    nested: &SerializationPtr,
    path: &mut SubstreamPath,
    callback: &mut dyn FnMut(&SubstreamPath),
    data_type: Option<&DataType>,
    column: Option<&ColumnPtr>,
) {
    let nested_type = match data_type {
        Some(DataType::Nullable(nested_type)) => Some(&**nested_type),
        _ => None,
    };
    let nullable = column.and_then(|c| match &**c {
        Column::Nullable(nullable) => Some(nullable),
        _ => None,
    });

    let null_map_serialization = Serialization::Named {
        name: "null".to_string(),
        escape_delimiter: false,
        nested: Arc::new(NULL_MAP),
    };
    let null_map = SubstreamData::new(Arc::new(null_map_serialization))
        .with_type(data_type.map(|_| DataType::UInt8))
        .with_column(nullable.map(|n| Arc::clone(n.null_map_column())));
    path.push(Substream::new(SubstreamType::NullMap).with_data(null_map));
    callback(path);
    path.pop();

    let elements = SubstreamData::new(Arc::clone(nested))
        .with_type(nested_type.cloned())
        .with_column(nullable.map(|n| Arc::clone(n.nested())))
        .with_creator(SubcolumnCreator::Nullable {
            null_map: nullable.map(|n| Arc::clone(n.null_map_column())),
        });
    path.push(Substream::new(SubstreamType::NullableElements).with_data(elements));
    nested.enumerate_streams(path, callback, nested_type, nullable.map(|n| n.nested()));
    path.pop();
}

pub(super) fn serialize_with_multiple_streams(
    nested: &SerializationPtr,
    column: &Column,
    offset: usize,
    limit: usize,
    settings: &mut SerializeBinaryBulkSettings<'_>,
) -> Result<(), TambakError> {
    let nullable = match column {
        Column::Nullable(nullable) => nullable,
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "Nullable".to_string(),
                actual: other.name(),
            })
        }
    };

    settings.scoped(SubstreamType::NullMap, |settings| match settings.stream() {
        Some(stream) => simple::serialize_binary_bulk(
            &DataType::UInt8,
            nullable.null_map_column(),
            stream,
            offset,
            limit,
        ),
        None => Ok(()),
    })?;
    settings.scoped(SubstreamType::NullableElements, |settings| {
        nested.serialize_binary_bulk_with_multiple_streams(nullable.nested(), offset, limit, settings)
    })
}

pub(super) fn deserialize_with_multiple_streams(
    nested: &SerializationPtr,
    column: &mut ColumnPtr,
    limit: usize,
    settings: &mut DeserializeBinaryBulkSettings<'_>,
    mut cache: Option<&mut SubstreamsCache>,
) -> Result<(), TambakError> {
    let (mut null_map, mut values) = match take_column(column) {
        Column::Nullable(nullable) => nullable.into_parts(),
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "Nullable".to_string(),
                actual: other.name(),
            })
        }
    };

    settings.scoped(SubstreamType::NullMap, |settings| {
        deserialize_leaf(&NULL_MAP, &mut null_map, limit, settings, cache.as_deref_mut())
    })?;
    settings.scoped(SubstreamType::NullableElements, |settings| {
        nested.deserialize_binary_bulk_with_multiple_streams(&mut values, limit, settings, cache)
    })?;

    *column = Arc::new(Column::Nullable(NullableColumn::try_new(null_map, values)?));
    Ok(())
}
