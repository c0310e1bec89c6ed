// In: src/bridge/arrow_impl.rs

//! DATA MARSHALLING between Arrow arrays and engine `Column`s.
//!
//! The target `DataType` drives both directions, so that the same array always
//! becomes the same column shape:
//!   * `Nullable(T)` takes the array's validity as its null map;
//!   * `Array(T)` is a `List`/`LargeList` (written back as `LargeList`);
//!   * `Tuple(..)` is a `Struct`;
//!   * `LowCardinality(T)` is a `Dictionary(UInt32, T)`.
//! Null list and struct slots are not representable and read back as the
//! values stored under them. Null dictionary keys are rejected.

use arrow::array::{
    make_array, Array, ArrayRef, AsArray, DictionaryArray, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, LargeListArray, PrimitiveArray, StringArray, StructArray,
    UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::buffer::{OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{
    ArrowPrimitiveType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow_schema::Fields;
use std::sync::Arc;

use crate::column::{ArrayColumn, Column, LowCardinalityColumn, NullableColumn, TupleColumn};
use crate::error::TambakError;
use crate::null_handling::bitmap;
use crate::types::DataType;

fn downcast_error(array: &dyn Array, expected: &DataType) -> TambakError {
    TambakError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{:?}", array.data_type()),
    }
}

/// Returns the dense values of a primitive array, including the slots under nulls.
fn primitive_values<T: ArrowPrimitiveType>(
    array: &dyn Array,
    expected: &DataType,
) -> Result<Vec<T::Native>, TambakError> {
    array
        .as_primitive_opt::<T>()
        .map(|a| a.values().to_vec())
        .ok_or_else(|| downcast_error(array, expected))
}

fn string_values(array: &dyn Array, expected: &DataType) -> Result<Vec<String>, TambakError> {
    if let Some(a) = array.as_string_opt::<i32>() {
        return Ok((0..a.len()).map(|i| a.value(i).to_string()).collect());
    }
    if let Some(a) = array.as_string_opt::<i64>() {
        return Ok((0..a.len()).map(|i| a.value(i).to_string()).collect());
    }
    Err(downcast_error(array, expected))
}

/// Rebases list offsets to start at zero and returns them with the matching
/// slice of the child values.
fn list_parts(array: &dyn Array, expected: &DataType) -> Result<(Vec<u64>, ArrayRef), TambakError> {
    macro_rules! parts {
        ($list:expr) => {{
            let list = $list;
            let offsets = list.value_offsets();
            let first = offsets.first().copied().unwrap_or_default();
            let last = offsets.last().copied().unwrap_or_default();
            let rebased = offsets.iter().skip(1).map(|&o| (o - first) as u64).collect();
            let values = list.values().slice(first as usize, (last - first) as usize);
            Ok((rebased, values))
        }};
    }
    if let Some(list) = array.as_list_opt::<i32>() {
        return parts!(list);
    }
    if let Some(list) = array.as_list_opt::<i64>() {
        return parts!(list);
    }
    Err(downcast_error(array, expected))
}

/// Converts `array` into a column shaped like `data_type`.
pub fn array_to_column(array: &dyn Array, data_type: &DataType) -> Result<Column, TambakError> {
    let column = match data_type {
        DataType::UInt8 => Column::UInt8(primitive_values::<UInt8Type>(array, data_type)?),
        DataType::UInt16 => Column::UInt16(primitive_values::<UInt16Type>(array, data_type)?),
        DataType::UInt32 => Column::UInt32(primitive_values::<UInt32Type>(array, data_type)?),
        DataType::UInt64 => Column::UInt64(primitive_values::<UInt64Type>(array, data_type)?),
        DataType::Int8 => Column::Int8(primitive_values::<Int8Type>(array, data_type)?),
        DataType::Int16 => Column::Int16(primitive_values::<Int16Type>(array, data_type)?),
        DataType::Int32 => Column::Int32(primitive_values::<Int32Type>(array, data_type)?),
        DataType::Int64 => Column::Int64(primitive_values::<Int64Type>(array, data_type)?),
        DataType::Float32 => Column::Float32(primitive_values::<Float32Type>(array, data_type)?),
        DataType::Float64 => Column::Float64(primitive_values::<Float64Type>(array, data_type)?),
        DataType::String => Column::String(string_values(array, data_type)?),
        DataType::Nullable(nested) => {
            let null_map = bitmap::null_map_from_nulls(array.nulls(), array.len());
            let values = array_to_column(array, nested)?;
            Column::Nullable(NullableColumn::try_new(
                Arc::new(Column::UInt8(null_map)),
                Arc::new(values),
            )?)
        }
        DataType::Array(nested) => {
            let (offsets, values) = list_parts(array, data_type)?;
            let data = array_to_column(values.as_ref(), nested)?;
            Column::Array(ArrayColumn::try_new(
                Arc::new(Column::UInt64(offsets)),
                Arc::new(data),
            )?)
        }
        DataType::Tuple(fields) => {
            let struct_array = array
                .as_struct_opt()
                .ok_or_else(|| downcast_error(array, data_type))?;
            if struct_array.num_columns() != fields.len() {
                return Err(downcast_error(array, data_type));
            }
            let columns = fields
                .iter()
                .zip(struct_array.columns())
                .map(|(field, child)| Ok(Arc::new(array_to_column(child.as_ref(), &field.data_type)?)))
                .collect::<Result<Vec<_>, TambakError>>()?;
            Column::Tuple(TupleColumn::try_new(columns)?)
        }
        DataType::LowCardinality(nested) => {
            let dictionary = array
                .as_dictionary_opt::<UInt32Type>()
                .ok_or_else(|| downcast_error(array, data_type))?;
            if dictionary.keys().null_count() > 0 {
                return Err(TambakError::UnsupportedType(format!(
                    "{} with {} null keys, {} has no null rows",
                    array.data_type(),
                    dictionary.keys().null_count(),
                    data_type
                )));
            }
            let keys = array_to_column(dictionary.values().as_ref(), nested)?;
            let indexes = dictionary.keys().values().to_vec();
            Column::LowCardinality(LowCardinalityColumn::try_new(
                Arc::new(keys),
                Arc::new(Column::UInt32(indexes)),
            )?)
        }
    };
    Ok(column)
}

/// Converts a column of `data_type` back into an Arrow array.
pub fn column_to_array(column: &Column, data_type: &DataType) -> Result<ArrayRef, TambakError> {
    let mismatch = || TambakError::TypeMismatch {
        expected: data_type.to_string(),
        actual: column.name(),
    };
    let array: ArrayRef = match (data_type, column) {
        (DataType::UInt8, Column::UInt8(v)) => Arc::new(UInt8Array::from(v.clone())),
        (DataType::UInt16, Column::UInt16(v)) => Arc::new(UInt16Array::from(v.clone())),
        (DataType::UInt32, Column::UInt32(v)) => Arc::new(UInt32Array::from(v.clone())),
        (DataType::UInt64, Column::UInt64(v)) => Arc::new(UInt64Array::from(v.clone())),
        (DataType::Int8, Column::Int8(v)) => Arc::new(Int8Array::from(v.clone())),
        (DataType::Int16, Column::Int16(v)) => Arc::new(Int16Array::from(v.clone())),
        (DataType::Int32, Column::Int32(v)) => Arc::new(Int32Array::from(v.clone())),
        (DataType::Int64, Column::Int64(v)) => Arc::new(Int64Array::from(v.clone())),
        (DataType::Float32, Column::Float32(v)) => Arc::new(Float32Array::from(v.clone())),
        (DataType::Float64, Column::Float64(v)) => Arc::new(Float64Array::from(v.clone())),
        (DataType::String, Column::String(v)) => Arc::new(StringArray::from(v.clone())),
        (DataType::Nullable(nested), Column::Nullable(nullable)) => {
            let values = column_to_array(nullable.nested(), nested)?;
            let nulls = bitmap::nulls_from_null_map(nullable.null_map());
            let data = values.to_data().into_builder().nulls(nulls).build()?;
            make_array(data)
        }
        (DataType::Array(nested), Column::Array(array)) => {
            let offsets: Vec<i64> = std::iter::once(0)
                .chain(array.offsets().iter().map(|&o| o as i64))
                .collect();
            let values = column_to_array(array.data(), nested)?;
            let field = Arc::new(nested.to_arrow_field("item"));
            Arc::new(LargeListArray::try_new(
                field,
                OffsetBuffer::new(ScalarBuffer::from(offsets)),
                values,
                None,
            )?)
        }
        (DataType::Tuple(fields), Column::Tuple(tuple)) => {
            if fields.len() != tuple.columns().len() {
                return Err(mismatch());
            }
            let arrow_fields: Fields = fields
                .iter()
                .map(|f| f.data_type.to_arrow_field(&f.name))
                .collect();
            let children = fields
                .iter()
                .zip(tuple.columns())
                .map(|(f, c)| column_to_array(c, &f.data_type))
                .collect::<Result<Vec<_>, TambakError>>()?;
            Arc::new(StructArray::try_new(arrow_fields, children, None)?)
        }
        (DataType::LowCardinality(nested), Column::LowCardinality(lc)) => {
            let keys = PrimitiveArray::<UInt32Type>::from(lc.indexes().to_vec());
            let values = column_to_array(lc.dictionary(), nested)?;
            Arc::new(DictionaryArray::<UInt32Type>::try_new(keys, values)?)
        }
        _ => return Err(mismatch()),
    };
    Ok(array)
}
