// In benches/end_to_end_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arrow::array::{Array, ArrayRef, DictionaryArray, Int64Array, ListArray, StringArray, StructArray, UInt32Array};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Fields, UInt32Type};
use rand::Rng;
use std::sync::Arc;

use tambak_substreams::bridge::{deserialize_arrow_column, serialize_arrow_column};
use tambak_substreams::TambakConfig;

// --- Mock Data Generation ---

/// Generates a `List<Struct<key, value>>` array, the shape of a map column.
fn generate_map_like_array(rows: usize) -> ArrayRef {
    let mut rng = rand::rng();
    let lengths: Vec<usize> = (0..rows).map(|_| rng.random_range(0..8)).collect();
    let total: usize = lengths.iter().sum();

    let keys: Vec<String> = (0..total).map(|i| format!("key_{}", i % 32)).collect();
    let values: Vec<u32> = (0..total).map(|_| rng.random_range(0..1_000)).collect();
    let fields = Fields::from(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("value", DataType::UInt32, false),
    ]);
    let entries = StructArray::new(
        fields.clone(),
        vec![
            Arc::new(StringArray::from(keys)) as ArrayRef,
            Arc::new(UInt32Array::from(values)) as ArrayRef,
        ],
        None,
    );
    Arc::new(ListArray::new(
        Arc::new(Field::new("item", DataType::Struct(fields), false)),
        OffsetBuffer::from_lengths(lengths),
        Arc::new(entries),
        None,
    ))
}

/// Generates a nullable Int64 array with roughly one null in ten.
fn generate_nullable_array(rows: usize) -> ArrayRef {
    let mut rng = rand::rng();
    let values: Int64Array = (0..rows)
        .map(|i| (rng.random_range(0..10) != 0).then_some(i as i64 * 3))
        .collect();
    Arc::new(values)
}

/// Generates a dictionary array over a small set of keys.
fn generate_dictionary_array(rows: usize) -> ArrayRef {
    let labels = ["alpha", "beta", "gamma", "delta"];
    let values: DictionaryArray<UInt32Type> = (0..rows).map(|i| labels[i % labels.len()]).collect();
    Arc::new(values)
}

// --- Benchmark Suite ---

const BENCH_ROWS: usize = 65_536;

fn bench_e2e_flow(c: &mut Criterion) {
    let config = TambakConfig::default();
    let mut group = c.benchmark_group("End-to-End Substream Flow (Arrow)");
    group.throughput(criterion::Throughput::Elements(BENCH_ROWS as u64));

    for (label, array) in [
        ("Map-Like", generate_map_like_array(BENCH_ROWS)),
        ("Nullable Int64", generate_nullable_array(BENCH_ROWS)),
        ("Dictionary", generate_dictionary_array(BENCH_ROWS)),
    ] {
        group.bench_function(format!("Serialize {}", label), |b| {
            b.iter(|| black_box(serialize_arrow_column("c", black_box(array.as_ref()), &config)))
        });

        let streams = serialize_arrow_column("c", array.as_ref(), &config).unwrap();
        assert_eq!(
            deserialize_arrow_column(&streams, &config).unwrap().len(),
            array.len()
        );
        group.bench_function(format!("Deserialize {}", label), |b| {
            b.iter(|| black_box(deserialize_arrow_column(black_box(&streams), &config)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_e2e_flow);
criterion_main!(benches);
