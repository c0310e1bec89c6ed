//! `LowCardinality(T)`: dictionary encoding over two streams.
//!
//! Every bulk write emits one block per stream. The `DictionaryKeys` stream gets
//! `[u64 key count][keys]` and the `DictionaryIndexes` stream gets `[u64 row
//! count][u32 index per row]`. Keys are local to the block and ordered by first
//! appearance, so a block is decodable on its own. A read that needs fewer rows
//! than a block holds keeps the rest in the settings' state for the next call.

use super::simple::{read_u64_header, write_u64_header};
use super::dispatch::effective_range;
use super::settings::PendingDictionaryBlock;
use super::{
    DeserializeBinaryBulkSettings, Serialization, SerializationPtr, SerializeBinaryBulkSettings,
    SubcolumnCreator, Substream, SubstreamData, SubstreamPath, SubstreamType,
};
use crate::column::{take_column, Column, ColumnPtr, LowCardinalityColumn};
use crate::error::TambakError;
use crate::types::DataType;
use hashbrown::HashMap;
use std::sync::Arc;

const INDEXES: Serialization = Serialization::Simple(DataType::UInt32);

pub(super) fn enumerate_streams(
    dictionary: &SerializationPtr,
    path: &mut SubstreamPath,
    callback: &mut dyn FnMut(&SubstreamPath),
    data_type: Option<&DataType>,
    column: Option<&ColumnPtr>,
) {
    let dictionary_type = match data_type {
        Some(DataType::LowCardinality(nested)) => Some(&**nested),
        _ => None,
    };
    let lc = column.and_then(|c| match &**c {
        Column::LowCardinality(lc) => Some(lc),
        _ => None,
    });

    let keys = SubstreamData::new(Arc::clone(dictionary))
        .with_type(dictionary_type.cloned())
        .with_column(lc.map(|lc| Arc::clone(lc.dictionary())))
        .with_creator(SubcolumnCreator::Dictionary {
            indexes: lc.map(|lc| Arc::clone(lc.indexes_column())),
        });
    path.push(Substream::new(SubstreamType::DictionaryKeys).with_data(keys));
    dictionary.enumerate_streams(path, callback, dictionary_type, lc.map(|lc| lc.dictionary()));
    path.pop();

    let indexes = SubstreamData::new(Arc::new(INDEXES))
        .with_type(data_type.map(|_| DataType::UInt32))
        .with_column(lc.map(|lc| Arc::clone(lc.indexes_column())));
    path.push(Substream::new(SubstreamType::DictionaryIndexes).with_data(indexes));
    callback(path);
    path.pop();
}

pub(super) fn serialize_with_multiple_streams(
    dictionary: &SerializationPtr,
    column: &Column,
    offset: usize,
    limit: usize,
    settings: &mut SerializeBinaryBulkSettings<'_>,
) -> Result<(), TambakError> {
    let lc = match column {
        Column::LowCardinality(lc) => lc,
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "LowCardinality".to_string(),
                actual: other.name(),
            })
        }
    };
    let range = effective_range(lc.len(), offset, limit);
    if range.is_empty() {
        return Ok(());
    }

    // Re-number the keys used by the range in order of first appearance.
    let mut remap: HashMap<u32, u32> = HashMap::new();
    let mut used_keys = Vec::new();
    let local_indexes: Vec<u32> = lc.indexes()[range]
        .iter()
        .map(|&index| {
            *remap.entry(index).or_insert_with(|| {
                used_keys.push(index as usize);
                (used_keys.len() - 1) as u32
            })
        })
        .collect();
    let keys = lc.dictionary().gather(&used_keys)?;

    settings.scoped(SubstreamType::DictionaryKeys, |settings| {
        let Some(stream) = settings.stream() else {
            return Ok(());
        };
        write_u64_header(stream, keys.len() as u64)?;
        dictionary.serialize_binary_bulk(&keys, stream, 0, 0)
    })?;
    settings.scoped(SubstreamType::DictionaryIndexes, |settings| {
        let Some(stream) = settings.stream() else {
            return Ok(());
        };
        write_u64_header(stream, local_indexes.len() as u64)?;
        INDEXES.serialize_binary_bulk(&Column::UInt32(local_indexes), stream, 0, 0)
    })
}

pub(super) fn deserialize_with_multiple_streams(
    dictionary: &SerializationPtr,
    column: &mut ColumnPtr,
    limit: usize,
    settings: &mut DeserializeBinaryBulkSettings<'_>,
) -> Result<(), TambakError> {
    let (keys, indexes) = match take_column(column) {
        Column::LowCardinality(lc) => lc.into_parts(),
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "LowCardinality".to_string(),
                actual: other.name(),
            })
        }
    };
    let mut keys = Arc::unwrap_or_clone(keys);
    let mut indexes = match Arc::unwrap_or_clone(indexes) {
        Column::UInt32(values) => values,
        other => {
            return Err(TambakError::TypeMismatch {
                expected: "UInt32".to_string(),
                actual: other.name(),
            })
        }
    };
    let hint = settings.avg_value_size_hint;
    let block_path = settings.path.to_string();

    let mut rows_read = 0;
    while rows_read < limit {
        let block = match settings.state.take_dictionary_block(&block_path) {
            Some(block) => block,
            None => match read_block(dictionary, &keys, settings, hint)? {
                Some(block) => block,
                None => break,
            },
        };
        let take = block.indexes.len().min(limit - rows_read);
        if take == 0 {
            continue;
        }

        let base = keys.len();
        keys.extend_from(&block.keys)?;
        if u32::try_from(keys.len()).is_err() {
            return Err(TambakError::CorruptedStream(format!(
                "dictionary of {} keys does not fit UInt32 indexes",
                keys.len()
            )));
        }
        let base = base as u32;
        indexes.extend(block.indexes[..take].iter().map(|&i| base + i));
        rows_read += take;

        if take < block.indexes.len() {
            log::trace!(
                "{}: {} rows of the dictionary block left for the next read",
                block_path,
                block.indexes.len() - take
            );
            settings.state.keep_dictionary_block(
                block_path.clone(),
                PendingDictionaryBlock {
                    indexes: block.indexes[take..].to_vec(),
                    keys: block.keys,
                },
            );
        }
    }

    let lc = LowCardinalityColumn::try_new(Arc::new(keys), Arc::new(Column::UInt32(indexes)))?;
    *column = Arc::new(Column::LowCardinality(lc));
    Ok(())
}


/// Reads the next block of both streams. `None` once the indexes stream is
/// absent or exhausted.
fn read_block(
    dictionary: &SerializationPtr,
    template: &Column,
    settings: &mut DeserializeBinaryBulkSettings<'_>,
    hint: f64,
) -> Result<Option<PendingDictionaryBlock>, TambakError> {
    let indexes = settings.scoped(
        SubstreamType::DictionaryIndexes,
        |settings| -> Result<Option<Vec<u32>>, TambakError> {
            let name = settings.path.to_string();
            let Some(stream) = settings.stream() else {
                return Ok(None);
            };
            let Some(rows) = read_u64_header(stream, &name)? else {
                return Ok(None);
            };
            let rows = rows as usize;
            let mut block = Column::UInt32(Vec::new());
            if INDEXES.deserialize_binary_bulk(&mut block, stream, rows, 0.0)? != rows {
                return Err(TambakError::TruncatedStream { column: name });
            }
            Ok(Some(block.as_u32_slice()?.to_vec()))
        },
    )?;
    let Some(indexes) = indexes else {
        return Ok(None);
    };

    let keys = settings.scoped(
        SubstreamType::DictionaryKeys,
        |settings| -> Result<Column, TambakError> {
            let name = settings.path.to_string();
            let stream = settings.stream().ok_or_else(|| {
                TambakError::CorruptedStream(
                    "dictionary indexes present without their dictionary stream".to_string(),
                )
            })?;
            let key_count = read_u64_header(stream, &name)?
                .ok_or_else(|| TambakError::TruncatedStream { column: name.clone() })?
                as usize;
            let mut keys = template.clone_empty();
            if dictionary.deserialize_binary_bulk(&mut keys, stream, key_count, hint)? != key_count {
                return Err(TambakError::TruncatedStream { column: name });
            }
            Ok(keys)
        },
    )?;

    if let Some(&index) = indexes.iter().find(|&&i| i as usize >= keys.len()) {
        return Err(TambakError::CorruptedStream(format!(
            "dictionary index {} out of range for a block of {} keys",
            index,
            keys.len()
        )));
    }
    Ok(Some(PendingDictionaryBlock { keys, indexes }))
}
