use super::*;
use crate::types::DataType;
use std::sync::Arc;

fn strings(values: &[&str]) -> ColumnPtr {
    Arc::new(Column::String(values.iter().map(|s| s.to_string()).collect()))
}

#[test]
fn test_empty_follows_type_shape() {
    let dt = DataType::array(DataType::tuple([
        ("key", DataType::String),
        ("value", DataType::nullable(DataType::UInt32)),
    ]));
    let column = Column::empty(&dt);

    assert!(column.is_empty());
    assert_eq!(column.name(), "Array(Tuple(String, Nullable(UInt32)))");
}

#[test]
fn test_array_from_sizes_builds_cumulative_offsets() {
    let array = ArrayColumn::from_sizes(&[2, 0, 1], strings(&["a", "b", "c"])).unwrap();

    assert_eq!(array.len(), 3);
    assert_eq!(array.offsets(), &[2, 2, 3]);
    assert_eq!(array.row_start(0), 0);
    assert_eq!(array.row_start(2), 2);
    assert_eq!(offsets_to_sizes(array.offsets()), vec![2, 0, 1]);
}

#[test]
fn test_array_sizes_that_overflow_are_corrupt() {
    let result = ArrayColumn::from_sizes(&[u64::MAX, 1], strings(&["a"]));
    assert!(matches!(result, Err(TambakError::CorruptedStream(_))));
    assert!(matches!(sizes_to_offsets(1, &[u64::MAX]), Err(TambakError::CorruptedStream(_))));
    assert_eq!(sizes_to_offsets(3, &[1, 2]).unwrap(), vec![4, 6]);
}

#[test]
fn test_array_rejects_offsets_not_matching_data() {
    let offsets = Arc::new(Column::UInt64(vec![1, 3]));
    let result = ArrayColumn::try_new(offsets, strings(&["a", "b"]));
    assert!(matches!(result, Err(TambakError::CorruptedStream(_))));

    let decreasing = Arc::new(Column::UInt64(vec![2, 1]));
    assert!(ArrayColumn::try_new(decreasing, strings(&["a"])).is_err());

    let wrong_type = Arc::new(Column::UInt32(vec![1]));
    assert!(matches!(
        ArrayColumn::try_new(wrong_type, strings(&["a"])),
        Err(TambakError::TypeMismatch { .. })
    ));
}

#[test]
fn test_tuple_requires_equal_lengths() {
    let ok = TupleColumn::try_new(vec![strings(&["a"]), Arc::new(Column::UInt32(vec![1]))]);
    assert!(ok.is_ok());

    let bad = TupleColumn::try_new(vec![strings(&["a", "b"]), Arc::new(Column::UInt32(vec![1]))]);
    assert!(bad.is_err());
    assert!(TupleColumn::try_new(Vec::new()).is_err());
}

#[test]
fn test_low_cardinality_validates_indexes_and_materializes() {
    let dict = strings(&["x", "y"]);
    let lc = LowCardinalityColumn::try_new(dict.clone(), Arc::new(Column::UInt32(vec![1, 0, 1])))
        .unwrap();
    assert_eq!(lc.to_full_column().unwrap(), *strings(&["y", "x", "y"]));

    let out_of_range = LowCardinalityColumn::try_new(dict, Arc::new(Column::UInt32(vec![2])));
    assert!(matches!(out_of_range, Err(TambakError::CorruptedStream(_))));
}

#[test]
fn test_extend_from_rejects_mismatched_variants() {
    let mut column = Column::UInt32(vec![1, 2]);
    column.extend_from(&Column::UInt32(vec![3])).unwrap();
    assert_eq!(column, Column::UInt32(vec![1, 2, 3]));

    let err = column.extend_from(&Column::Int32(vec![4])).unwrap_err();
    assert!(matches!(err, TambakError::TypeMismatch { .. }));
}

#[test]
fn test_gather_picks_rows_in_order() {
    let column = Column::Float64(vec![0.5, 1.5, 2.5]);
    assert_eq!(column.gather(&[2, 0]).unwrap(), Column::Float64(vec![2.5, 0.5]));
    assert!(column.gather(&[3]).is_err());
}
