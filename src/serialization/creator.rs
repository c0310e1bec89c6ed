//! Reconstruction of intermediate nodes of the decomposition tree.
//!
//! Every structural step that hides a level of nesting records a
//! [`SubcolumnCreator`]: the minimal data needed to wrap a child-level value
//! back into its parent shape. [`create_from_path`] folds those creators from
//! the deepest ancestor to the root to give any path prefix its full type,
//! serialization and column.

use super::data::SubstreamData;
use super::{Serialization, SerializationPtr, Substream};
use crate::column::{ArrayColumn, Column, ColumnPtr, LowCardinalityColumn, NullableColumn};
use crate::error::TambakError;
use crate::types::DataType;
use std::sync::Arc;

/// The inverse of one decomposition step.
///
/// The captured parts are absent when the step was taken during a shape-only
/// traversal; creating a column then fails, creating a type or serialization
/// does not.
#[derive(Debug, Clone, PartialEq)]
pub enum SubcolumnCreator {
    /// Wraps elements into arrays with the given cumulative offsets.
    Array { offsets: Option<ColumnPtr> },
    /// Wraps values into a nullable with the given null map.
    Nullable { null_map: Option<ColumnPtr> },
    /// Projects a named tuple field. Types and columns pass through; the
    /// serialization is re-wrapped so that it keeps addressing the field's streams.
    TupleField {
        name: String,
        escape_delimiter: bool,
    },
    /// Wraps a dictionary into a dictionary-encoded column with the given indexes.
    Dictionary { indexes: Option<ColumnPtr> },
}

impl SubcolumnCreator {
    pub fn create_type(&self, prev: DataType) -> DataType {
        match self {
            SubcolumnCreator::Array { .. } => DataType::array(prev),
            SubcolumnCreator::Nullable { .. } => DataType::nullable(prev),
            SubcolumnCreator::TupleField { .. } => prev,
            SubcolumnCreator::Dictionary { .. } => DataType::low_cardinality(prev),
        }
    }

    pub fn create_serialization(&self, prev: SerializationPtr) -> SerializationPtr {
        Arc::new(match self {
            SubcolumnCreator::Array { .. } => Serialization::Array(prev),
            SubcolumnCreator::Nullable { .. } => Serialization::Nullable(prev),
            SubcolumnCreator::TupleField {
                name,
                escape_delimiter,
            } => Serialization::Named {
                name: name.clone(),
                escape_delimiter: *escape_delimiter,
                nested: prev,
            },
            SubcolumnCreator::Dictionary { .. } => Serialization::LowCardinality(prev),
        })
    }

    pub fn create_column(&self, prev: ColumnPtr) -> Result<ColumnPtr, TambakError> {
        let missing = |part: &str| {
            TambakError::InternalError(format!(
                "cannot rebuild a column without its {} (shape-only traversal)",
                part
            ))
        };
        let column = match self {
            SubcolumnCreator::Array { offsets } => {
                let offsets = offsets.clone().ok_or_else(|| missing("array offsets"))?;
                Column::Array(ArrayColumn::try_new(offsets, prev)?)
            }
            SubcolumnCreator::Nullable { null_map } => {
                let null_map = null_map.clone().ok_or_else(|| missing("null map"))?;
                Column::Nullable(NullableColumn::try_new(null_map, prev)?)
            }
            SubcolumnCreator::TupleField { .. } => return Ok(prev),
            SubcolumnCreator::Dictionary { indexes } => {
                let indexes = indexes.clone().ok_or_else(|| missing("dictionary indexes"))?;
                Column::LowCardinality(LowCardinalityColumn::try_new(prev, indexes)?)
            }
        };
        Ok(Arc::new(column))
    }
}

/// Rebuilds the data of the node at `path[prefix_len]` as if the column had been
/// decomposed only that far.
///
/// `prefix_len` must index the path. A violation means the traversal and the
/// path are out of sync: debug builds panic, release builds return
/// [`TambakError::InvalidPathPrefix`].
pub fn create_from_path(path: &[Substream], prefix_len: usize) -> Result<SubstreamData, TambakError> {
    debug_assert!(
        prefix_len < path.len(),
        "prefix {} out of range for path of length {}",
        prefix_len,
        path.len()
    );
    let step = path.get(prefix_len).ok_or(TambakError::InvalidPathPrefix {
        prefix_len,
        path_len: path.len(),
    })?;

    let mut res = step.data.clone();
    res.creator = None;
    for ancestor in path[..prefix_len].iter().rev() {
        let Some(creator) = &ancestor.data.creator else {
            continue;
        };
        res.data_type = res.data_type.map(|t| creator.create_type(t));
        res.serialization = res.serialization.map(|s| creator.create_serialization(s));
        res.column = res.column.map(|c| creator.create_column(c)).transpose()?;
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{SubstreamPath, SubstreamType};

    fn leaf_data() -> SubstreamData {
        SubstreamData::new(Arc::new(Serialization::Simple(DataType::UInt32)))
            .with_type(Some(DataType::UInt32))
            .with_column(Some(Arc::new(Column::UInt32(vec![7, 8, 9]))))
    }

    #[test]
    fn test_creators_fold_deepest_first() {
        // Arrange: Array (outer, creator A) of Nullable (creator B) of the leaf.
        let null_map = Arc::new(Column::UInt8(vec![0, 1, 0]));
        let offsets = Arc::new(Column::UInt64(vec![1, 3]));
        let path: SubstreamPath = vec![
            Substream::new(SubstreamType::ArrayElements).with_data(
                SubstreamData::default().with_creator(SubcolumnCreator::Array {
                    offsets: Some(offsets.clone()),
                }),
            ),
            Substream::new(SubstreamType::NullableElements).with_data(
                SubstreamData::default().with_creator(SubcolumnCreator::Nullable {
                    null_map: Some(null_map.clone()),
                }),
            ),
            Substream::new(SubstreamType::Regular).with_data(
                leaf_data().with_creator(SubcolumnCreator::Dictionary { indexes: None }),
            ),
        ]
        .into();

        // Act
        let res = create_from_path(&path, 2).unwrap();

        // Assert: B is applied before A, and the leaf's own creator is ignored.
        assert_eq!(
            res.data_type,
            Some(DataType::array(DataType::nullable(DataType::UInt32)))
        );
        let nullable = NullableColumn::try_new(null_map, Arc::new(Column::UInt32(vec![7, 8, 9])))
            .unwrap();
        let expected = ArrayColumn::try_new(offsets, Arc::new(Column::Nullable(nullable))).unwrap();
        assert_eq!(res.column.as_deref(), Some(&Column::Array(expected)));
        assert!(res.creator.is_none());
        assert!(matches!(
            res.serialization.as_deref(),
            Some(Serialization::Array(inner)) if matches!(**inner, Serialization::Nullable(_))
        ));
    }

    #[test]
    fn test_tuple_field_creator_passes_type_and_column_through() {
        let path: SubstreamPath = vec![
            Substream::tuple_element("v", true).with_data(SubstreamData::default().with_creator(
                SubcolumnCreator::TupleField {
                    name: "v".to_string(),
                    escape_delimiter: true,
                },
            )),
            Substream::new(SubstreamType::Regular).with_data(leaf_data()),
        ]
        .into();

        let res = create_from_path(&path, 1).unwrap();
        assert_eq!(res.data_type, Some(DataType::UInt32));
        assert_eq!(res.column, leaf_data().column);
        assert!(matches!(
            res.serialization.as_deref(),
            Some(Serialization::Named { name, .. }) if name == "v"
        ));
    }

    #[test]
    fn test_shape_only_parts_stay_absent() {
        let path: SubstreamPath = vec![
            Substream::new(SubstreamType::ArrayElements).with_data(
                SubstreamData::default().with_creator(SubcolumnCreator::Array { offsets: None }),
            ),
            Substream::new(SubstreamType::Regular).with_data(
                SubstreamData::new(Arc::new(Serialization::Simple(DataType::String)))
                    .with_type(Some(DataType::String)),
            ),
        ]
        .into();

        let res = create_from_path(&path, 1).unwrap();
        assert_eq!(res.data_type, Some(DataType::array(DataType::String)));
        assert!(res.column.is_none());
    }

    #[test]
    fn test_missing_offsets_cannot_build_a_column() {
        let creator = SubcolumnCreator::Array { offsets: None };
        let result = creator.create_column(Arc::new(Column::UInt8(vec![1])));
        assert!(matches!(result, Err(TambakError::InternalError(_))));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "out of range"))]
    fn test_prefix_must_index_the_path() {
        let path: SubstreamPath = vec![Substream::new(SubstreamType::ArraySizes)].into();
        let result = create_from_path(&path, 1);
        assert!(matches!(
            result,
            Err(TambakError::InvalidPathPrefix {
                prefix_len: 1,
                path_len: 1
            })
        ));
    }
}
