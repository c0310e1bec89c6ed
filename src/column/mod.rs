//! In-memory column values consumed and produced by the substream engine.
//!
//! A `Column` is immutable once shared: every composite part is held behind an
//! `Arc` (`ColumnPtr`) so that subcolumns can be cached and handed out without
//! copying. Readers mutate through `Arc::make_mut`, which copies only when a
//! part is still shared.

mod composite;

pub use composite::{ArrayColumn, LowCardinalityColumn, NullableColumn, TupleColumn};

use crate::error::TambakError;
use crate::types::DataType;
use std::sync::Arc;

pub type ColumnPtr = Arc<Column>;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<String>),
    Array(ArrayColumn),
    Tuple(TupleColumn),
    Nullable(NullableColumn),
    LowCardinality(LowCardinalityColumn),
}

/// Expands `$body` once per fixed-width variant with `$values` bound to the
/// inner vector (by reference or mutable reference, following `$column`).
macro_rules! with_numeric {
    ($column:expr, |$values:ident| $body:expr, else $fallback:expr) => {
        match $column {
            $crate::column::Column::UInt8($values) => $body,
            $crate::column::Column::UInt16($values) => $body,
            $crate::column::Column::UInt32($values) => $body,
            $crate::column::Column::UInt64($values) => $body,
            $crate::column::Column::Int8($values) => $body,
            $crate::column::Column::Int16($values) => $body,
            $crate::column::Column::Int32($values) => $body,
            $crate::column::Column::Int64($values) => $body,
            $crate::column::Column::Float32($values) => $body,
            $crate::column::Column::Float64($values) => $body,
            #[allow(unreachable_patterns)]
            _ => $fallback,
        }
    };
}
pub(crate) use with_numeric;

impl Column {
    /// Creates an empty column shaped like `data_type`.
    pub fn empty(data_type: &DataType) -> Column {
        match data_type {
            DataType::UInt8 => Column::UInt8(Vec::new()),
            DataType::UInt16 => Column::UInt16(Vec::new()),
            DataType::UInt32 => Column::UInt32(Vec::new()),
            DataType::UInt64 => Column::UInt64(Vec::new()),
            DataType::Int8 => Column::Int8(Vec::new()),
            DataType::Int16 => Column::Int16(Vec::new()),
            DataType::Int32 => Column::Int32(Vec::new()),
            DataType::Int64 => Column::Int64(Vec::new()),
            DataType::Float32 => Column::Float32(Vec::new()),
            DataType::Float64 => Column::Float64(Vec::new()),
            DataType::String => Column::String(Vec::new()),
            DataType::Array(nested) => Column::Array(ArrayColumn::empty(nested)),
            DataType::Tuple(fields) => Column::Tuple(TupleColumn::empty(fields)),
            DataType::Nullable(nested) => Column::Nullable(NullableColumn::empty(nested)),
            DataType::LowCardinality(nested) => {
                Column::LowCardinality(LowCardinalityColumn::empty(nested))
            }
        }
    }

    /// Creates an empty column of the same shape as `self`.
    pub fn clone_empty(&self) -> Column {
        match self {
            Column::String(_) => Column::String(Vec::new()),
            Column::Array(array) => Column::Array(array.clone_empty()),
            Column::Tuple(tuple) => Column::Tuple(tuple.clone_empty()),
            Column::Nullable(nullable) => Column::Nullable(nullable.clone_empty()),
            Column::LowCardinality(lc) => Column::LowCardinality(lc.clone_empty()),
            Column::UInt8(_) => Column::UInt8(Vec::new()),
            Column::UInt16(_) => Column::UInt16(Vec::new()),
            Column::UInt32(_) => Column::UInt32(Vec::new()),
            Column::UInt64(_) => Column::UInt64(Vec::new()),
            Column::Int8(_) => Column::Int8(Vec::new()),
            Column::Int16(_) => Column::Int16(Vec::new()),
            Column::Int32(_) => Column::Int32(Vec::new()),
            Column::Int64(_) => Column::Int64(Vec::new()),
            Column::Float32(_) => Column::Float32(Vec::new()),
            Column::Float64(_) => Column::Float64(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::String(values) => values.len(),
            Column::Array(array) => array.len(),
            Column::Tuple(tuple) => tuple.len(),
            Column::Nullable(nullable) => nullable.len(),
            Column::LowCardinality(lc) => lc.len(),
            numeric => with_numeric!(numeric, |values| values.len(), else 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The column family name used in diagnostics, e.g. `Array(Tuple(String, UInt32))`.
    pub fn name(&self) -> String {
        match self {
            Column::UInt8(_) => "UInt8".to_string(),
            Column::UInt16(_) => "UInt16".to_string(),
            Column::UInt32(_) => "UInt32".to_string(),
            Column::UInt64(_) => "UInt64".to_string(),
            Column::Int8(_) => "Int8".to_string(),
            Column::Int16(_) => "Int16".to_string(),
            Column::Int32(_) => "Int32".to_string(),
            Column::Int64(_) => "Int64".to_string(),
            Column::Float32(_) => "Float32".to_string(),
            Column::Float64(_) => "Float64".to_string(),
            Column::String(_) => "String".to_string(),
            Column::Array(array) => format!("Array({})", array.data().name()),
            Column::Tuple(tuple) => format!(
                "Tuple({})",
                tuple
                    .columns()
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Column::Nullable(nullable) => format!("Nullable({})", nullable.nested().name()),
            Column::LowCardinality(lc) => format!("LowCardinality({})", lc.dictionary().name()),
        }
    }

    /// Appends the values of a leaf column of the same variant.
    pub fn extend_from(&mut self, other: &Column) -> Result<(), TambakError> {
        macro_rules! extend {
            ($($variant:ident),+) => {
                match (&mut *self, other) {
                    $( (Column::$variant(dst), Column::$variant(src)) => {
                        dst.extend_from_slice(src);
                        Ok(())
                    } )+
                    (dst, src) => Err(TambakError::TypeMismatch {
                        expected: dst.name(),
                        actual: src.name(),
                    }),
                }
            };
        }
        extend!(
            UInt8, UInt16, UInt32, UInt64, Int8, Int16, Int32, Int64, Float32, Float64, String
        )
    }

    /// Gathers the rows at `indexes` of a leaf column into a new column.
    pub fn gather(&self, indexes: &[usize]) -> Result<Column, TambakError> {
        let out_of_range = |i: usize| {
            TambakError::InternalError(format!(
                "gather index {} out of range for column of {} rows",
                i,
                self.len()
            ))
        };
        match self {
            Column::String(values) => Ok(Column::String(
                indexes
                    .iter()
                    .map(|&i| values.get(i).cloned().ok_or_else(|| out_of_range(i)))
                    .collect::<Result<_, _>>()?,
            )),
            numeric => {
                let mut gathered = numeric.clone_empty();
                gather_numeric(numeric, &mut gathered, indexes)?;
                Ok(gathered)
            }
        }
    }

    /// Returns the values of a `UInt64` column (array offsets, array sizes).
    pub fn as_u64_slice(&self) -> Result<&[u64], TambakError> {
        match self {
            Column::UInt64(values) => Ok(values),
            other => Err(TambakError::TypeMismatch {
                expected: "UInt64".to_string(),
                actual: other.name(),
            }),
        }
    }

    /// Returns the values of a `UInt8` column (null maps).
    pub fn as_u8_slice(&self) -> Result<&[u8], TambakError> {
        match self {
            Column::UInt8(values) => Ok(values),
            other => Err(TambakError::TypeMismatch {
                expected: "UInt8".to_string(),
                actual: other.name(),
            }),
        }
    }

    /// Returns the values of a `UInt32` column (dictionary indexes).
    pub fn as_u32_slice(&self) -> Result<&[u32], TambakError> {
        match self {
            Column::UInt32(values) => Ok(values),
            other => Err(TambakError::TypeMismatch {
                expected: "UInt32".to_string(),
                actual: other.name(),
            }),
        }
    }
}

fn gather_numeric(
    source: &Column,
    target: &mut Column,
    indexes: &[usize],
) -> Result<(), TambakError> {
    macro_rules! gather {
        ($($variant:ident),+) => {
            match (source, target) {
                $( (Column::$variant(src), Column::$variant(dst)) => {
                    dst.reserve(indexes.len());
                    for &i in indexes {
                        let value = src.get(i).copied().ok_or_else(|| {
                            TambakError::InternalError(format!(
                                "gather index {} out of range for column of {} rows",
                                i,
                                src.len()
                            ))
                        })?;
                        dst.push(value);
                    }
                    Ok(())
                } )+
                (src, _) => Err(TambakError::UnsupportedType(format!(
                    "gather is only defined for leaf columns, got {}",
                    src.name()
                ))),
            }
        };
    }
    gather!(UInt8, UInt16, UInt32, UInt64, Int8, Int16, Int32, Int64, Float32, Float64)
}

/// Takes the column out of `column` without copying it when it is not shared.
/// `column` is left holding an empty placeholder.
pub(crate) fn take_column(column: &mut ColumnPtr) -> Column {
    let taken = std::mem::replace(column, Arc::new(Column::UInt8(Vec::new())));
    Arc::unwrap_or_clone(taken)
}

/// Converts per-row sizes into cumulative offsets continuing after `start`.
/// Sizes whose running total does not fit in a `u64` are corrupt.
pub fn sizes_to_offsets(start: u64, sizes: &[u64]) -> Result<Vec<u64>, TambakError> {
    let mut end = start;
    sizes
        .iter()
        .map(|&size| -> Result<u64, TambakError> {
            end = end.checked_add(size).ok_or_else(|| {
                TambakError::CorruptedStream(format!(
                    "array sizes overflow: {} + {} does not fit in an offset",
                    end, size
                ))
            })?;
            Ok(end)
        })
        .collect()
}

/// Converts cumulative array offsets into per-row sizes.
pub fn offsets_to_sizes(offsets: &[u64]) -> Vec<u64> {
    let mut prev = 0;
    offsets
        .iter()
        .map(|&offset| {
            let size = offset - prev;
            prev = offset;
            size
        })
        .collect()
}

#[cfg(test)]
mod tests;
