// In tests/end_to_end.rs

use rand::Rng;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, ListArray, StringArray, StructArray, UInt32Array};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType as ArrowDataType, Field, Fields, UInt32Type};

use tambak_substreams::bridge::{deserialize_arrow_column, serialize_arrow_column};
use tambak_substreams::column::{ArrayColumn, TupleColumn};
use tambak_substreams::serialization::{
    escape_for_file_name, extract_table_name, file_name_for_stream, unescape_for_file_name,
    DeserializeBinaryBulkSettings, SerializeBinaryBulkSettings, SubstreamsCache,
};
use tambak_substreams::subcolumns::{get_subcolumn_serialization, get_subcolumn_type};
use tambak_substreams::{
    Column, ColumnPtr, DataType, MemoryStreamStore, SubstreamPath, TambakConfig,
};

fn map_type() -> DataType {
    "Array(Tuple(key String, value UInt32))".parse().unwrap()
}

fn map_column() -> Column {
    let tuple = TupleColumn::try_new(vec![
        Arc::new(Column::String(vec!["a".to_string(), "b".to_string()])),
        Arc::new(Column::UInt32(vec![1, 2])),
    ])
    .unwrap();
    Column::Array(ArrayColumn::from_sizes(&[2], Arc::new(Column::Tuple(tuple))).unwrap())
}

#[test]
fn test_map_column_end_to_end() {
    let data_type = map_type();
    let serialization = data_type.default_serialization().unwrap();

    // 1. Enumeration: element streams first, then the sizes.
    let mut names = Vec::new();
    serialization.enumerate_streams(
        &mut SubstreamPath::new(),
        &mut |path: &SubstreamPath| names.push(file_name_for_stream("m", path)),
        Some(&data_type),
        None,
    );
    assert_eq!(names, vec!["m%2Ekey", "m%2Evalue", "m.size0"]);

    // 2. Write the whole column.
    let column = map_column();
    let mut store = MemoryStreamStore::new("m");
    let mut settings = SerializeBinaryBulkSettings::new(&mut store);
    serialization
        .serialize_binary_bulk_with_multiple_streams(&column, 0, 0, &mut settings)
        .unwrap();

    // 3. Read it back with a cache.
    store.rewind();
    let mut restored: ColumnPtr = Arc::new(Column::empty(&data_type));
    let mut cache = SubstreamsCache::new();
    let mut settings = DeserializeBinaryBulkSettings::new(&mut store);
    serialization
        .deserialize_binary_bulk_with_multiple_streams(&mut restored, 1, &mut settings, Some(&mut cache))
        .unwrap();

    assert_eq!(*restored, column);
    assert_eq!(cache.names(), vec!["key", "size0", "value"]);

    // 4. A subcolumn reads only its own streams.
    store.rewind();
    let key_type = get_subcolumn_type(&data_type, "key").unwrap().unwrap();
    let key_serialization = get_subcolumn_serialization(&data_type, "key").unwrap().unwrap();
    let mut keys: ColumnPtr = Arc::new(Column::empty(&key_type));
    let mut settings = DeserializeBinaryBulkSettings::new(&mut store);
    key_serialization
        .deserialize_binary_bulk_with_multiple_streams(&mut keys, 1, &mut settings, None)
        .unwrap();
    assert_eq!(key_type, DataType::array(DataType::String));
    assert_eq!(
        *keys,
        Column::Array(
            ArrayColumn::from_sizes(
                &[2],
                Arc::new(Column::String(vec!["a".to_string(), "b".to_string()]))
            )
            .unwrap()
        )
    );
    assert_eq!(store.requested_streams(), &["m.size0".to_string(), "m%2Ekey".to_string()]);
}

#[test]
fn test_single_stream_writer_rejects_the_map_column() {
    let serialization = map_type().default_serialization().unwrap();
    let err = serialization
        .serialize_binary_bulk(&map_column(), &mut Vec::<u8>::new(), 0, 0)
        .unwrap_err();
    assert!(err.to_string().contains("must be serialized with multiple streams"));
}

#[test]
fn test_arrow_map_like_column_end_to_end() {
    let fields = Fields::from(vec![
        Field::new("key", ArrowDataType::Utf8, false),
        Field::new("value", ArrowDataType::UInt32, false),
    ]);
    let entries = StructArray::new(
        fields.clone(),
        vec![
            Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef,
            Arc::new(UInt32Array::from(vec![1, 2])) as ArrayRef,
        ],
        None,
    );
    let original = ListArray::new(
        Arc::new(Field::new("item", ArrowDataType::Struct(fields), false)),
        OffsetBuffer::from_lengths([2]),
        Arc::new(entries),
        None,
    );
    let config = TambakConfig::from_json(r#"{"profile": "fast", "granule_rows": 1}"#).unwrap();

    let streams = serialize_arrow_column("m", &original, &config).unwrap();
    assert_eq!(streams.data_type, map_type());
    assert_eq!(streams.rows, 1);

    let restored = deserialize_arrow_column(&streams, &config).unwrap();
    assert_eq!(restored.len(), 1);
    let list = restored.as_list::<i64>();
    let values = list.values().as_struct().column(1).as_primitive::<UInt32Type>().clone();
    assert_eq!(values.values().to_vec(), vec![1, 2]);
}

#[test]
fn test_escaping_round_trips_random_names() {
    let alphabet: Vec<char> = "aZ09_.-%/ é€".chars().collect();
    let mut rng = rand::rng();
    for _ in 0..500 {
        let len = rng.random_range(0..16);
        let name: String = (0..len)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())])
            .collect();
        let escaped = escape_for_file_name(&name);

        assert!(escaped
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'%'));
        assert_eq!(unescape_for_file_name(&escaped), name);
    }
}

#[test]
fn test_extract_table_name() {
    assert_eq!(extract_table_name("t.c"), "t");
    assert_eq!(extract_table_name("t.c.d"), "t");
    assert_eq!(extract_table_name(".c"), ".c");
    assert_eq!(extract_table_name("t."), "t.");
    assert_eq!(extract_table_name("plain"), "plain");
}
