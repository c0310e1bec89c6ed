//! Single-stream codecs of the leaf types.
//!
//! Fixed-width values are stored as their in-memory bytes (little-endian on all
//! supported targets). Strings are a LEB128 length followed by the UTF-8 bytes.

use super::dispatch::effective_range;
use crate::column::{with_numeric, Column};
use crate::error::TambakError;
use crate::kernels::leb128;
use crate::types::DataType;
use std::io::{ErrorKind, Read, Write};

/// Values decoded per buffer refill.
const CHUNK_ROWS: usize = 8192;

/// Upper bound on the bytes reserved up front from a size hint.
const RESERVE_BUDGET_BYTES: usize = 16 << 20;

fn check_leaf(data_type: &DataType, column: &Column) -> Result<(), TambakError> {
    if data_type.is_composite()
        || std::mem::discriminant(&Column::empty(data_type)) != std::mem::discriminant(column)
    {
        return Err(TambakError::TypeMismatch {
            expected: data_type.to_string(),
            actual: column.name(),
        });
    }
    Ok(())
}

pub(super) fn serialize_binary_bulk(
    data_type: &DataType,
    column: &Column,
    out: &mut dyn Write,
    offset: usize,
    limit: usize,
) -> Result<(), TambakError> {
    check_leaf(data_type, column)?;
    let range = effective_range(column.len(), offset, limit);
    match column {
        Column::String(values) => {
            let mut buf = Vec::new();
            for value in &values[range] {
                leb128::encode_one(value.len() as u64, &mut buf)?;
                buf.extend_from_slice(value.as_bytes());
            }
            out.write_all(&buf)?;
        }
        numeric => with_numeric!(
            numeric,
            |values| out.write_all(bytemuck::cast_slice(&values[range]))?,
            else return Err(TambakError::InternalError(format!(
                "{} is not a leaf column",
                numeric.name()
            )))
        ),
    }
    Ok(())
}

pub(super) fn deserialize_binary_bulk(
    data_type: &DataType,
    column: &mut Column,
    input: &mut dyn Read,
    limit: usize,
    avg_value_size_hint: f64,
) -> Result<usize, TambakError> {
    check_leaf(data_type, column)?;
    let name = data_type.to_string();
    match column {
        Column::String(values) => {
            values.reserve(rows_to_reserve(limit, avg_value_size_hint.max(1.0)));
            read_strings(values, input, limit, &name)
        }
        numeric => with_numeric!(
            numeric,
            |values| read_fixed(values, input, limit, &name),
            else Err(TambakError::InternalError(format!("{} is not a leaf column", name)))
        ),
    }
}

fn rows_to_reserve(limit: usize, value_size: f64) -> usize {
    let by_budget = (RESERVE_BUDGET_BYTES as f64 / value_size) as usize;
    limit.min(by_budget)
}

fn read_fixed<T: bytemuck::Pod>(
    values: &mut Vec<T>,
    input: &mut dyn Read,
    limit: usize,
    column: &str,
) -> Result<usize, TambakError> {
    let width = std::mem::size_of::<T>();
    let mut buf = vec![0u8; width * limit.min(CHUNK_ROWS)];
    values.reserve(rows_to_reserve(limit, width as f64));

    let mut total = 0;
    while total < limit {
        let rows = (limit - total).min(CHUNK_ROWS);
        let chunk = &mut buf[..rows * width];
        let filled = read_full(input, chunk)?;
        let whole = filled / width;
        values.extend(
            chunk[..whole * width]
                .chunks_exact(width)
                .map(bytemuck::pod_read_unaligned::<T>),
        );
        total += whole;

        if filled < chunk.len() {
            if filled % width != 0 {
                return Err(TambakError::TruncatedStream {
                    column: column.to_string(),
                });
            }
            break;
        }
    }
    Ok(total)
}

fn read_strings(
    values: &mut Vec<String>,
    input: &mut dyn Read,
    limit: usize,
    column: &str,
) -> Result<usize, TambakError> {
    let mut total = 0;
    while total < limit {
        let Some(len) = leb128::decode_one::<u64, _>(input)? else {
            break;
        };
        let mut bytes = Vec::new();
        (&mut *input).take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(TambakError::TruncatedStream {
                column: column.to_string(),
            });
        }
        let value = String::from_utf8(bytes)
            .map_err(|e| TambakError::CorruptedStream(format!("invalid UTF-8 in {}: {}", column, e)))?;
        values.push(value);
        total += 1;
    }
    Ok(total)
}

/// Fills `buf` as far as the reader allows and returns the number of bytes read.
pub(super) fn read_full(input: &mut dyn Read, buf: &mut [u8]) -> Result<usize, TambakError> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Reads a little-endian `u64` block header. `None` on a clean end of stream.
pub(super) fn read_u64_header(input: &mut dyn Read, stream: &str) -> Result<Option<u64>, TambakError> {
    let mut header = [0u8; 8];
    match read_full(input, &mut header)? {
        0 => Ok(None),
        8 => Ok(Some(u64::from_le_bytes(header))),
        _ => Err(TambakError::TruncatedStream {
            column: stream.to_string(),
        }),
    }
}

pub(super) fn write_u64_header(out: &mut dyn Write, value: u64) -> Result<(), TambakError> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_write_the_selected_range() {
        let column = Column::UInt32(vec![1, 2, 3, 4]);
        let mut out = Vec::new();
        serialize_binary_bulk(&DataType::UInt32, &column, &mut out, 1, 2).unwrap();
        assert_eq!(out, [2u32, 3].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>());
    }

    #[test]
    fn test_read_stops_at_limit_and_appends() {
        let bytes: Vec<u8> = [10i64, 20, 30].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut input: &[u8] = &bytes;
        let mut column = Column::Int64(vec![5]);

        let rows = deserialize_binary_bulk(&DataType::Int64, &mut column, &mut input, 2, 0.0).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(column, Column::Int64(vec![5, 10, 20]));

        let rows = deserialize_binary_bulk(&DataType::Int64, &mut column, &mut input, 10, 0.0).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(column, Column::Int64(vec![5, 10, 20, 30]));
    }

    #[test]
    fn test_strings_roundtrip_with_multibyte_lengths() {
        let long = "x".repeat(300);
        let column = Column::String(vec!["".to_string(), "héllo".to_string(), long.clone()]);
        let mut out = Vec::new();
        serialize_binary_bulk(&DataType::String, &column, &mut out, 0, 0).unwrap();

        let mut input: &[u8] = &out;
        let mut decoded = Column::String(Vec::new());
        let rows = deserialize_binary_bulk(&DataType::String, &mut decoded, &mut input, 100, 8.0).unwrap();
        assert_eq!(rows, 3);
        assert_eq!(decoded, column);
    }

    #[test]
    fn test_partial_value_is_truncation() {
        let mut input: &[u8] = &[1, 0, 0, 0, 2, 0];
        let mut column = Column::UInt32(Vec::new());
        let err = deserialize_binary_bulk(&DataType::UInt32, &mut column, &mut input, 5, 0.0).unwrap_err();
        assert!(matches!(err, TambakError::TruncatedStream { .. }));

        let mut input: &[u8] = &[5, b'a', b'b'];
        let mut column = Column::String(Vec::new());
        assert!(deserialize_binary_bulk(&DataType::String, &mut column, &mut input, 5, 0.0).is_err());
    }

    #[test]
    fn test_rejects_column_of_another_type() {
        let column = Column::UInt8(vec![1]);
        let err = serialize_binary_bulk(&DataType::UInt16, &column, &mut Vec::new(), 0, 0).unwrap_err();
        assert!(matches!(err, TambakError::TypeMismatch { .. }));
    }
}
