// ====================================================================================
// ARCHITECTURAL OVERVIEW: Substream Decomposition
// ====================================================================================
//
// A logical column is written as a flat set of named binary streams, one per
// leaf of its decomposition tree:
//
//   Array(Tuple(key String, value UInt32)) named `m`
//     |
//     +-- ArrayElements -> TupleElement(key)   -> Regular   => stream `m%2Ekey`
//     +-- ArrayElements -> TupleElement(value) -> Regular   => stream `m%2Evalue`
//     +-- ArraySizes                                        => stream `m.size0`
//
// Each `Serialization` variant knows which structural steps it pushes onto the
// `SubstreamPath` before recursing into its children. At every leaf the stream
// getter is asked for the stream of the current path, which is then handled by
// the single-stream codec of the leaf type (`simple`). Reads consult the
// per-call `SubstreamsCache` at the same boundaries.
//
// ====================================================================================

mod array;
pub mod cache;
pub mod creator;
mod data;
mod dispatch;
mod low_cardinality;
pub mod naming;
mod nullable;
mod path;
pub mod policy;
mod settings;
mod simple;
mod substream;
mod tuple;

pub use cache::{add_to_substreams_cache, get_from_substreams_cache, SubstreamsCache};
pub use creator::{create_from_path, SubcolumnCreator};
pub use data::SubstreamData;
pub use dispatch::effective_range;
pub use naming::{
    escape_for_file_name, extract_table_name, file_name_for_column, file_name_for_stream,
    subcolumn_name_for_stream, subcolumn_name_for_stream_prefix, unescape_for_file_name,
};
pub use path::SubstreamPath;
pub use policy::{get_array_level, has_subcolumn_for_path, is_special_compression_allowed};
pub use settings::{
    DeserializeBinaryBulkSettings, DeserializeBinaryBulkState, InputStreamGetter,
    OutputStreamGetter, SerializeBinaryBulkSettings,
};
pub use substream::{Substream, SubstreamType};

use crate::column::{Column, ColumnPtr};
use crate::error::{BulkDirection, TambakError};
use crate::types::DataType;
use hashbrown::HashSet;
use std::io::{Read, Write};
use std::sync::Arc;

pub type SerializationPtr = Arc<Serialization>;

/// The decomposition rule of one node of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Serialization {
    /// A number or string stored in a single `Regular` stream.
    Simple(DataType),
    /// `ArraySizes` leaf plus `ArrayElements` subtree.
    Array(SerializationPtr),
    /// One element per field, each a `Named` serialization.
    Tuple(Vec<SerializationPtr>),
    /// Prefixes the nested streams with a `TupleElement` step.
    Named {
        name: String,
        escape_delimiter: bool,
        nested: SerializationPtr,
    },
    /// `NullMap` leaf plus `NullableElements` subtree.
    Nullable(SerializationPtr),
    /// `DictionaryKeys` subtree plus `DictionaryIndexes` leaf.
    LowCardinality(SerializationPtr),
}

impl DataType {
    /// The serialization that decomposes values of this type.
    ///
    /// Fails for shapes the engine cannot store: a `Nullable` over a composite
    /// type, a `LowCardinality` over a composite type, and tuples without
    /// fields or with duplicate field names.
    pub fn default_serialization(&self) -> Result<SerializationPtr, TambakError> {
        let serialization = match self {
            DataType::Array(nested) => Serialization::Array(nested.default_serialization()?),
            DataType::Tuple(fields) => {
                if fields.is_empty() {
                    return Err(TambakError::UnsupportedType(
                        "Tuple must have at least one element".to_string(),
                    ));
                }
                let mut names = HashSet::new();
                let mut elements = Vec::with_capacity(fields.len());
                for field in fields {
                    if !names.insert(field.name.as_str()) {
                        return Err(TambakError::UnsupportedType(format!(
                            "duplicate tuple element name '{}' in {}",
                            field.name, self
                        )));
                    }
                    elements.push(Arc::new(Serialization::Named {
                        name: field.name.clone(),
                        escape_delimiter: true,
                        nested: field.data_type.default_serialization()?,
                    }));
                }
                Serialization::Tuple(elements)
            }
            DataType::Nullable(nested) => {
                if !nested.can_be_inside_nullable() {
                    return Err(TambakError::UnsupportedType(format!(
                        "{} cannot be inside Nullable",
                        nested
                    )));
                }
                Serialization::Nullable(nested.default_serialization()?)
            }
            DataType::LowCardinality(nested) => {
                if nested.is_composite() {
                    return Err(TambakError::UnsupportedType(format!(
                        "LowCardinality({}) is not supported, the dictionary must be a number or a string",
                        nested
                    )));
                }
                Serialization::LowCardinality(nested.default_serialization()?)
            }
            leaf => Serialization::Simple(leaf.clone()),
        };
        Ok(Arc::new(serialization))
    }
}

impl Serialization {
    /// Calls `callback` for every leaf stream, depth-first, with the path
    /// leading to it. Steps carry whatever of `data_type` and `column` is known.
    pub fn enumerate_streams(
        self: &Arc<Self>,
        path: &mut SubstreamPath,
        callback: &mut dyn FnMut(&SubstreamPath),
        data_type: Option<&DataType>,
        column: Option<&ColumnPtr>,
    ) {
        match &**self {
            Serialization::Simple(_) => {
                dispatch::enumerate_leaf(self, path, callback, data_type, column)
            }
            Serialization::Array(nested) => {
                array::enumerate_streams(nested, path, callback, data_type, column)
            }
            Serialization::Tuple(elements) => {
                tuple::enumerate_streams(elements, path, callback, data_type, column)
            }
            Serialization::Named {
                name,
                escape_delimiter,
                nested,
            } => tuple::enumerate_named(
                self,
                name,
                *escape_delimiter,
                nested,
                path,
                callback,
                data_type,
                column,
            ),
            Serialization::Nullable(nested) => {
                nullable::enumerate_streams(nested, path, callback, data_type, column)
            }
            Serialization::LowCardinality(dictionary) => {
                low_cardinality::enumerate_streams(dictionary, path, callback, data_type, column)
            }
        }
    }

    /// Enumerates the stream shape only.
    pub fn enumerate_streams_default(
        self: &Arc<Self>,
        callback: &mut dyn FnMut(&SubstreamPath),
        path: &mut SubstreamPath,
    ) {
        self.enumerate_streams(path, callback, None, None)
    }

    /// Writes rows `[offset, offset + limit)` of a leaf column to one stream
    /// (`limit == 0` writes to the end). Composite types need several streams
    /// and fail with `MultipleStreamsRequired`.
    pub fn serialize_binary_bulk(
        &self,
        column: &Column,
        out: &mut dyn Write,
        offset: usize,
        limit: usize,
    ) -> Result<(), TambakError> {
        match self {
            Serialization::Simple(data_type) => {
                simple::serialize_binary_bulk(data_type, column, out, offset, limit)
            }
            _ => Err(TambakError::multiple_streams_required(
                &column.name(),
                BulkDirection::Serialize,
            )),
        }
    }

    /// Appends up to `limit` values read from one stream to a leaf column and
    /// returns how many were read. Composite types fail with
    /// `MultipleStreamsRequired`.
    pub fn deserialize_binary_bulk(
        &self,
        column: &mut Column,
        input: &mut dyn Read,
        limit: usize,
        avg_value_size_hint: f64,
    ) -> Result<usize, TambakError> {
        match self {
            Serialization::Simple(data_type) => {
                simple::deserialize_binary_bulk(data_type, column, input, limit, avg_value_size_hint)
            }
            _ => Err(TambakError::multiple_streams_required(
                &column.name(),
                BulkDirection::Deserialize,
            )),
        }
    }

    /// Writes rows `[offset, offset + limit)` to the streams the getter hands
    /// out. Streams the getter declines are skipped.
    pub fn serialize_binary_bulk_with_multiple_streams(
        &self,
        column: &Column,
        offset: usize,
        limit: usize,
        settings: &mut SerializeBinaryBulkSettings<'_>,
    ) -> Result<(), TambakError> {
        match self {
            Serialization::Simple(_) => {
                dispatch::serialize_leaf(self, column, offset, limit, settings)
            }
            Serialization::Array(nested) => {
                array::serialize_with_multiple_streams(nested, column, offset, limit, settings)
            }
            Serialization::Tuple(elements) => {
                tuple::serialize_with_multiple_streams(elements, column, offset, limit, settings)
            }
            Serialization::Named {
                name,
                escape_delimiter,
                nested,
            } => settings.scoped(Substream::tuple_element(name, *escape_delimiter), |settings| {
                nested.serialize_binary_bulk_with_multiple_streams(column, offset, limit, settings)
            }),
            Serialization::Nullable(nested) => {
                nullable::serialize_with_multiple_streams(nested, column, offset, limit, settings)
            }
            Serialization::LowCardinality(dictionary) => {
                low_cardinality::serialize_with_multiple_streams(
                    dictionary, column, offset, limit, settings,
                )
            }
        }
    }

    /// Reads up to `limit` rows from the streams the getter hands out and
    /// appends them to `column`. Subcolumns found in `cache` are reused instead
    /// of being decoded again, and every decoded subcolumn is added to it.
    ///
    /// If a stream is not available the corresponding part of the column is
    /// left unchanged. On error the column content is unspecified.
    pub fn deserialize_binary_bulk_with_multiple_streams(
        &self,
        column: &mut ColumnPtr,
        limit: usize,
        settings: &mut DeserializeBinaryBulkSettings<'_>,
        cache: Option<&mut SubstreamsCache>,
    ) -> Result<(), TambakError> {
        match self {
            Serialization::Simple(_) => {
                dispatch::deserialize_leaf(self, column, limit, settings, cache)
            }
            Serialization::Array(nested) => {
                array::deserialize_with_multiple_streams(nested, column, limit, settings, cache)
            }
            Serialization::Tuple(elements) => {
                tuple::deserialize_with_multiple_streams(elements, column, limit, settings, cache)
            }
            Serialization::Named {
                name,
                escape_delimiter,
                nested,
            } => settings.scoped(Substream::tuple_element(name, *escape_delimiter), |settings| {
                nested.deserialize_binary_bulk_with_multiple_streams(column, limit, settings, cache)
            }),
            Serialization::Nullable(nested) => {
                nullable::deserialize_with_multiple_streams(nested, column, limit, settings, cache)
            }
            Serialization::LowCardinality(dictionary) => {
                low_cardinality::deserialize_with_multiple_streams(
                    dictionary, column, limit, settings,
                )
            }
        }
    }
}
