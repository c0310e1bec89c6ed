//! Discovery and materialization of subcolumns.
//!
//! Every structural step that exposes a meaningful part of a column (a null
//! map, array sizes, a tuple element) defines a subcolumn, addressable by its
//! logical name (`null`, `size0`, `key`, `key.null`, ...). The subcolumn's type,
//! serialization and (optionally) column are rebuilt from the decomposition
//! path with [`create_from_path`]. The serialization reads the subcolumn
//! straight from the parent column's streams.

use crate::column::ColumnPtr;
use crate::error::TambakError;
use crate::serialization::{
    create_from_path, has_subcolumn_for_path, subcolumn_name_for_stream_prefix, SerializationPtr,
    SubstreamData, SubstreamPath,
};
use crate::types::{DataType, NameAndType};
use hashbrown::HashSet;

/// Calls `callback` once per subcolumn of `data_type`, in stream order, with the
/// subcolumn name and its rebuilt data. The data carries a column only when
/// `column` is given.
pub fn for_each_subcolumn(
    data_type: &DataType,
    column: Option<&ColumnPtr>,
    callback: &mut dyn FnMut(&str, &SubstreamData),
) -> Result<(), TambakError> {
    let serialization = data_type.default_serialization()?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut first_error = None;

    let mut visit = |path: &SubstreamPath| {
        if first_error.is_some() {
            return;
        }
        for i in 0..path.len() {
            if !has_subcolumn_for_path(path, i + 1) {
                continue;
            }
            // Sibling leaves share their ancestors' subcolumns.
            let name = subcolumn_name_for_stream_prefix(path, i + 1);
            if !seen.insert(name.clone()) {
                continue;
            }
            match create_from_path(path, i) {
                Ok(data) => callback(&name, &data),
                Err(err) => {
                    first_error = Some(err);
                    return;
                }
            }
        }
    };
    serialization.enumerate_streams(&mut SubstreamPath::new(), &mut visit, Some(data_type), column);

    first_error.map_or(Ok(()), Err)
}

pub fn subcolumn_names(data_type: &DataType) -> Result<Vec<String>, TambakError> {
    let mut names = Vec::new();
    for_each_subcolumn(data_type, None, &mut |name, _| names.push(name.to_string()))?;
    Ok(names)
}

/// The subcolumns of a stored column, each addressed through its storage name.
pub fn get_subcolumns(column: &NameAndType) -> Result<Vec<NameAndType>, TambakError> {
    let mut subcolumns = Vec::new();
    for_each_subcolumn(&column.data_type, None, &mut |name, data| {
        if let Some(data_type) = &data.data_type {
            subcolumns.push(NameAndType::subcolumn(
                column.name_in_storage(),
                name,
                data_type.clone(),
            ));
        }
    })?;
    Ok(subcolumns)
}

fn find_subcolumn(
    data_type: &DataType,
    column: Option<&ColumnPtr>,
    subcolumn_name: &str,
) -> Result<Option<SubstreamData>, TambakError> {
    let mut found = None;
    for_each_subcolumn(data_type, column, &mut |name, data| {
        if found.is_none() && name == subcolumn_name {
            found = Some(data.clone());
        }
    })?;
    Ok(found)
}

pub fn get_subcolumn_type(
    data_type: &DataType,
    subcolumn_name: &str,
) -> Result<Option<DataType>, TambakError> {
    Ok(find_subcolumn(data_type, None, subcolumn_name)?.and_then(|data| data.data_type))
}

/// The serialization that reads `subcolumn_name` from the streams of a column of
/// `data_type`, starting from an empty path.
pub fn get_subcolumn_serialization(
    data_type: &DataType,
    subcolumn_name: &str,
) -> Result<Option<SerializationPtr>, TambakError> {
    Ok(find_subcolumn(data_type, None, subcolumn_name)?.and_then(|data| data.serialization))
}

/// Extracts `subcolumn_name` from an in-memory column of `data_type`.
pub fn get_subcolumn(
    data_type: &DataType,
    column: &ColumnPtr,
    subcolumn_name: &str,
) -> Result<Option<ColumnPtr>, TambakError> {
    Ok(find_subcolumn(data_type, Some(column), subcolumn_name)?.and_then(|data| data.column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ArrayColumn, Column, NullableColumn, TupleColumn};
    use crate::serialization::{DeserializeBinaryBulkSettings, SerializeBinaryBulkSettings};
    use crate::streams::MemoryStreamStore;
    use std::sync::Arc;

    fn map_type() -> DataType {
        DataType::array(DataType::tuple([
            ("key", DataType::String),
            ("value", DataType::UInt32),
        ]))
    }

    fn map_column() -> ColumnPtr {
        let tuple = TupleColumn::try_new(vec![
            Arc::new(Column::String(vec!["a".into(), "b".into()])),
            Arc::new(Column::UInt32(vec![1, 2])),
        ])
        .unwrap();
        Arc::new(Column::Array(
            ArrayColumn::from_sizes(&[2], Arc::new(Column::Tuple(tuple))).unwrap(),
        ))
    }

    #[test]
    fn test_subcolumn_names_and_types() {
        assert_eq!(subcolumn_names(&map_type()).unwrap(), vec!["key", "value", "size0"]);
        assert_eq!(
            get_subcolumn_type(&map_type(), "key").unwrap(),
            Some(DataType::array(DataType::String))
        );
        assert_eq!(get_subcolumn_type(&map_type(), "size0").unwrap(), Some(DataType::UInt64));
        assert_eq!(get_subcolumn_type(&map_type(), "missing").unwrap(), None);
    }

    #[test]
    fn test_nested_subcolumns_are_reported_once() {
        let data_type = DataType::tuple([
            ("n", DataType::nullable(DataType::String)),
            ("a", DataType::array(DataType::array(DataType::UInt8))),
        ]);
        assert_eq!(
            subcolumn_names(&data_type).unwrap(),
            vec!["n", "n.null", "a", "a.size1", "a.size0"]
        );
        assert_eq!(
            get_subcolumn_type(&data_type, "a.size1").unwrap(),
            Some(DataType::array(DataType::UInt64))
        );
    }

    #[test]
    fn test_get_subcolumns_keeps_storage_name() {
        let column = NameAndType::new("m", map_type());
        let subcolumns = get_subcolumns(&column).unwrap();
        let names: Vec<String> = subcolumns.iter().map(NameAndType::full_name).collect();
        assert_eq!(names, vec!["m.key", "m.value", "m.size0"]);
        assert!(subcolumns.iter().all(|s| s.name_in_storage() == "m"));
    }

    #[test]
    fn test_get_subcolumn_from_memory() {
        let column = map_column();
        let values = get_subcolumn(&map_type(), &column, "value").unwrap().unwrap();
        let expected =
            ArrayColumn::from_sizes(&[2], Arc::new(Column::UInt32(vec![1, 2]))).unwrap();
        assert_eq!(*values, Column::Array(expected));

        let sizes = get_subcolumn(&map_type(), &column, "size0").unwrap().unwrap();
        assert_eq!(*sizes, Column::UInt64(vec![2]));
    }

    #[test]
    fn test_null_map_subcolumn_from_memory() {
        let data_type = DataType::nullable(DataType::Int32);
        let column: ColumnPtr = Arc::new(Column::Nullable(
            NullableColumn::try_new(
                Arc::new(Column::UInt8(vec![1, 0])),
                Arc::new(Column::Int32(vec![0, 5])),
            )
            .unwrap(),
        ));
        let null_map = get_subcolumn(&data_type, &column, "null").unwrap().unwrap();
        assert_eq!(*null_map, Column::UInt8(vec![1, 0]));
    }

    #[test]
    fn test_subcolumns_read_from_the_parent_streams() {
        // Arrange: the whole column is written once.
        let data_type = map_type();
        let mut store = MemoryStreamStore::new("m");
        let serialization = data_type.default_serialization().unwrap();
        let mut settings = SerializeBinaryBulkSettings::new(&mut store);
        serialization
            .serialize_binary_bulk_with_multiple_streams(&map_column(), 0, 0, &mut settings)
            .unwrap();

        // Act + Assert: each subcolumn is read on its own.
        for (name, expected) in [
            ("value", get_subcolumn(&data_type, &map_column(), "value").unwrap().unwrap()),
            ("size0", Arc::new(Column::UInt64(vec![2]))),
        ] {
            store.rewind();
            let subcolumn_type = get_subcolumn_type(&data_type, name).unwrap().unwrap();
            let subcolumn = get_subcolumn_serialization(&data_type, name).unwrap().unwrap();
            let mut column = Arc::new(Column::empty(&subcolumn_type));
            let mut settings = DeserializeBinaryBulkSettings::new(&mut store);
            subcolumn
                .deserialize_binary_bulk_with_multiple_streams(&mut column, 1, &mut settings, None)
                .unwrap();
            assert_eq!(column, expected, "subcolumn {}", name);
        }
        assert!(!store.requested_streams().contains(&"m".to_string()));
    }
}
