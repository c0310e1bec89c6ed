//! Composite column parts. Their constructors validate the structural
//! invariants every serialization relies on.

use super::{Column, ColumnPtr};
use crate::error::TambakError;
use crate::types::{DataType, TupleField};
use std::sync::Arc;

//==================================================================================
// Array
//==================================================================================

/// Arrays store cumulative end offsets (`UInt64`), one per row, over a flat
/// data column. The last offset always equals the data length.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayColumn {
    offsets: ColumnPtr,
    data: ColumnPtr,
}

impl ArrayColumn {
    pub fn try_new(offsets: ColumnPtr, data: ColumnPtr) -> Result<Self, TambakError> {
        let values = offsets.as_u64_slice()?;
        if values.windows(2).any(|w| w[0] > w[1]) {
            return Err(TambakError::CorruptedStream(
                "array offsets are not monotonically non-decreasing".to_string(),
            ));
        }
        let last = values.last().copied().unwrap_or(0);
        if last as usize != data.len() {
            return Err(TambakError::CorruptedStream(format!(
                "array offsets end at {} but the nested column has {} rows",
                last,
                data.len()
            )));
        }
        Ok(Self { offsets, data })
    }

    /// Builds an array column from per-row sizes.
    pub fn from_sizes(sizes: &[u64], data: ColumnPtr) -> Result<Self, TambakError> {
        let offsets = super::sizes_to_offsets(0, sizes)?;
        Self::try_new(Arc::new(Column::UInt64(offsets)), data)
    }

    pub(crate) fn empty(nested: &DataType) -> Self {
        Self {
            offsets: Arc::new(Column::UInt64(Vec::new())),
            data: Arc::new(Column::empty(nested)),
        }
    }

    pub(crate) fn clone_empty(&self) -> Self {
        Self {
            offsets: Arc::new(Column::UInt64(Vec::new())),
            data: Arc::new(self.data.clone_empty()),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offsets_column(&self) -> &ColumnPtr {
        &self.offsets
    }

    pub fn offsets(&self) -> &[u64] {
        // Guaranteed to be a UInt64 column by `try_new`.
        self.offsets.as_u64_slice().unwrap_or(&[])
    }

    pub fn data(&self) -> &ColumnPtr {
        &self.data
    }

    pub fn into_parts(self) -> (ColumnPtr, ColumnPtr) {
        (self.offsets, self.data)
    }

    /// Offset of the first element of `row`.
    pub fn row_start(&self, row: usize) -> u64 {
        if row == 0 {
            0
        } else {
            self.offsets()[row - 1]
        }
    }
}

//==================================================================================
// Tuple
//==================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TupleColumn {
    columns: Vec<ColumnPtr>,
}

impl TupleColumn {
    pub fn try_new(columns: Vec<ColumnPtr>) -> Result<Self, TambakError> {
        if columns.is_empty() {
            return Err(TambakError::UnsupportedType(
                "a tuple column needs at least one element".to_string(),
            ));
        }
        let rows = columns[0].len();
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(TambakError::CorruptedStream(format!(
                "tuple elements have different sizes: {} and {}",
                rows,
                bad.len()
            )));
        }
        Ok(Self { columns })
    }

    pub(crate) fn empty(fields: &[TupleField]) -> Self {
        Self {
            columns: fields
                .iter()
                .map(|f| Arc::new(Column::empty(&f.data_type)))
                .collect(),
        }
    }

    pub(crate) fn clone_empty(&self) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Arc::new(c.clone_empty()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[ColumnPtr] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<ColumnPtr> {
        self.columns
    }
}

//==================================================================================
// Nullable
//==================================================================================

/// A null map (`UInt8`, 1 = null) next to a nested column of the same length.
/// Values of the nested column at null positions are unspecified defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct NullableColumn {
    null_map: ColumnPtr,
    nested: ColumnPtr,
}

impl NullableColumn {
    pub fn try_new(null_map: ColumnPtr, nested: ColumnPtr) -> Result<Self, TambakError> {
        let map = null_map.as_u8_slice()?;
        if map.len() != nested.len() {
            return Err(TambakError::CorruptedStream(format!(
                "null map has {} rows but the nested column has {}",
                map.len(),
                nested.len()
            )));
        }
        Ok(Self { null_map, nested })
    }

    pub(crate) fn empty(nested: &DataType) -> Self {
        Self {
            null_map: Arc::new(Column::UInt8(Vec::new())),
            nested: Arc::new(Column::empty(nested)),
        }
    }

    pub(crate) fn clone_empty(&self) -> Self {
        Self {
            null_map: Arc::new(Column::UInt8(Vec::new())),
            nested: Arc::new(self.nested.clone_empty()),
        }
    }

    pub fn len(&self) -> usize {
        self.null_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_map_column(&self) -> &ColumnPtr {
        &self.null_map
    }

    pub fn null_map(&self) -> &[u8] {
        self.null_map.as_u8_slice().unwrap_or(&[])
    }

    pub fn nested(&self) -> &ColumnPtr {
        &self.nested
    }

    pub fn into_parts(self) -> (ColumnPtr, ColumnPtr) {
        (self.null_map, self.nested)
    }
}

//==================================================================================
// LowCardinality
//==================================================================================

/// Dictionary encoding: a leaf dictionary column and one `UInt32` index per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LowCardinalityColumn {
    dictionary: ColumnPtr,
    indexes: ColumnPtr,
}

impl LowCardinalityColumn {
    pub fn try_new(dictionary: ColumnPtr, indexes: ColumnPtr) -> Result<Self, TambakError> {
        if dictionary.len() > u32::MAX as usize {
            return Err(TambakError::UnsupportedType(
                "dictionary exceeds UInt32 index range".to_string(),
            ));
        }
        if matches!(
            *dictionary,
            Column::Array(_) | Column::Tuple(_) | Column::Nullable(_) | Column::LowCardinality(_)
        ) {
            return Err(TambakError::UnsupportedType(format!(
                "LowCardinality dictionary must be a leaf column, got {}",
                dictionary.name()
            )));
        }
        let size = dictionary.len() as u32;
        if let Some(bad) = indexes.as_u32_slice()?.iter().find(|&&i| i >= size) {
            return Err(TambakError::CorruptedStream(format!(
                "dictionary index {} out of range for dictionary of {} keys",
                bad, size
            )));
        }
        Ok(Self {
            dictionary,
            indexes,
        })
    }

    pub(crate) fn empty(nested: &DataType) -> Self {
        Self {
            dictionary: Arc::new(Column::empty(nested)),
            indexes: Arc::new(Column::UInt32(Vec::new())),
        }
    }

    pub(crate) fn clone_empty(&self) -> Self {
        Self {
            dictionary: Arc::new(self.dictionary.clone_empty()),
            indexes: Arc::new(Column::UInt32(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dictionary(&self) -> &ColumnPtr {
        &self.dictionary
    }

    pub fn indexes_column(&self) -> &ColumnPtr {
        &self.indexes
    }

    pub fn indexes(&self) -> &[u32] {
        self.indexes.as_u32_slice().unwrap_or(&[])
    }

    pub fn into_parts(self) -> (ColumnPtr, ColumnPtr) {
        (self.dictionary, self.indexes)
    }

    /// Materializes the dictionary-encoded rows as a plain leaf column.
    pub fn to_full_column(&self) -> Result<Column, TambakError> {
        let positions: Vec<usize> = self.indexes().iter().map(|&i| i as usize).collect();
        self.dictionary.gather(&positions)
    }
}
