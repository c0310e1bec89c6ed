//! `Tuple(n1 T1, ...)`: every element is written under its own `TupleElement`
//! step through a `Named` serialization.

use super::{
    DeserializeBinaryBulkSettings, SerializationPtr, SerializeBinaryBulkSettings,
    SubcolumnCreator, Substream, SubstreamData, SubstreamPath, SubstreamsCache,
};
use crate::column::{take_column, Column, ColumnPtr, TupleColumn};
use crate::error::TambakError;
use crate::types::DataType;
use std::sync::Arc;

fn element_count_mismatch(expected: usize, actual: usize) -> TambakError {
    TambakError::TypeMismatch {
        expected: format!("Tuple of {} elements", expected),
        actual: format!("Tuple of {} elements", actual),
    }
}

pub(super) fn enumerate_streams(
    elements: &[SerializationPtr],
    path: &mut SubstreamPath,
    callback: &mut dyn FnMut(&SubstreamPath),
    data_type: Option<&DataType>,
    column: Option<&ColumnPtr>,
) {
    let fields = match data_type {
        Some(DataType::Tuple(fields)) => Some(fields),
        _ => None,
    };
    let tuple = column.and_then(|c| match &**c {
        Column::Tuple(tuple) => Some(tuple),
        _ => None,
    });

    for (i, element) in elements.iter().enumerate() {
        let element_type = fields.and_then(|f| f.get(i)).map(|f| &f.data_type);
        let element_column = tuple.and_then(|t| t.columns().get(i));
        element.enumerate_streams(path, callback, element_type, element_column);
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn enumerate_named(
    named: &SerializationPtr,
    name: &str,
    escape_delimiter: bool,
    nested: &SerializationPtr,
    path: &mut SubstreamPath,
    callback: &mut dyn FnMut(&SubstreamPath),
    data_type: Option<&DataType>,
    column: Option<&ColumnPtr>,
) {
    let data = SubstreamData::new(Arc::clone(named))
        .with_type(data_type.cloned())
        .with_column(column.cloned())
        .with_creator(SubcolumnCreator::TupleField {
            name: name.to_string(),
            escape_delimiter,
        });
    path.push(Substream::tuple_element(name, escape_delimiter).with_data(data));
    nested.enumerate_streams(path, callback, data_type, column);
    path.pop();
}

pub(super) fn serialize_with_multiple_streams(
    elements: &[SerializationPtr],
    column: &Column,
    offset: usize,
    limit: usize,
    settings: &mut SerializeBinaryBulkSettings<'_>,
) -> Result<(), TambakError> {
    let tuple = match column {
        Column::Tuple(tuple) => tuple,
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "Tuple".to_string(),
                actual: other.name(),
            })
        }
    };
    if tuple.columns().len() != elements.len() {
        return Err(element_count_mismatch(elements.len(), tuple.columns().len()));
    }

    for (element, element_column) in elements.iter().zip(tuple.columns()) {
        element.serialize_binary_bulk_with_multiple_streams(element_column, offset, limit, settings)?;
    }
    Ok(())
}

pub(super) fn deserialize_with_multiple_streams(
    elements: &[SerializationPtr],
    column: &mut ColumnPtr,
    limit: usize,
    settings: &mut DeserializeBinaryBulkSettings<'_>,
    mut cache: Option<&mut SubstreamsCache>,
) -> Result<(), TambakError> {
    let mut columns = match take_column(column) {
        Column::Tuple(tuple) => tuple.into_columns(),
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "Tuple".to_string(),
                actual: other.name(),
            })
        }
    };
    if columns.len() != elements.len() {
        return Err(element_count_mismatch(elements.len(), columns.len()));
    }

    for (element, element_column) in elements.iter().zip(columns.iter_mut()) {
        element.deserialize_binary_bulk_with_multiple_streams(
            element_column,
            limit,
            settings,
            cache.as_deref_mut(),
        )?;
    }

    *column = Arc::new(Column::Tuple(TupleColumn::try_new(columns)?));
    Ok(())
}
