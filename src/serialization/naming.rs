//! Physical stream names and logical subcolumn names.
//!
//! Stream names are persisted: old data is only readable while these functions
//! produce byte-identical names for the same `(column, path)`.

use super::{Substream, SubstreamType};
use crate::types::NameAndType;

/// Percent-encodes every byte outside `[A-Za-z0-9_]` as `%XX` (uppercase hex).
pub fn escape_for_file_name(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for &byte in s.as_bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' {
            res.push(byte as char);
        } else {
            res.push('%');
            res.push(hex_digit(byte >> 4));
            res.push(hex_digit(byte & 0x0F));
        }
    }
    res
}

/// Inverse of [`escape_for_file_name`]. A `%` not followed by two hex digits is
/// kept literally.
pub fn unescape_for_file_name(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut res = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).and_then(|&b| unhex(b)),
                bytes.get(i + 2).and_then(|&b| unhex(b)),
            ) {
                res.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        res.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&res).into_owned()
}

fn hex_digit(nibble: u8) -> char {
    char::from(b"0123456789ABCDEF"[nibble as usize])
}

fn unhex(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

/// The table part of a nested-group column name: `t` for `t.c`.
///
/// The name is split at its first dot, unless that dot is the first or the last
/// character; names without such a dot are returned whole.
pub fn extract_table_name(name: &str) -> &str {
    match name.find('.') {
        Some(idx) if idx != 0 && idx + 1 != name.len() => &name[..idx],
        _ => name,
    }
}

fn name_for_substream_path(
    mut stream_name: String,
    steps: &[Substream],
    escape_tuple_delimiter: bool,
) -> String {
    let mut array_level = 0;
    for step in steps {
        match step.kind {
            SubstreamType::NullMap => stream_name.push_str(".null"),
            SubstreamType::ArraySizes => {
                stream_name.push_str(".size");
                stream_name.push_str(&array_level.to_string());
            }
            SubstreamType::ArrayElements => array_level += 1,
            SubstreamType::DictionaryKeys => stream_name.push_str(".dict"),
            SubstreamType::SparseOffsets => stream_name.push_str(".sparse.idx"),
            SubstreamType::TupleElement => {
                // Nested columns may also be stored as separate `a.b` arrays whose
                // names are escaped as a whole, hence the escaped dot.
                if escape_tuple_delimiter && step.escape_tuple_delimiter {
                    stream_name.push_str("%2E");
                } else {
                    stream_name.push('.');
                }
                stream_name.push_str(&escape_for_file_name(&step.tuple_element_name));
            }
            SubstreamType::Regular
            | SubstreamType::NullableElements
            | SubstreamType::DictionaryIndexes
            | SubstreamType::SparseElements => {}
        }
    }
    stream_name
}

/// The physical stream name of `path` under the column stored as `name_in_storage`.
pub fn file_name_for_stream(name_in_storage: &str, path: &[Substream]) -> String {
    let nested_storage_name = extract_table_name(name_in_storage);
    // Sibling arrays of one nested group share the group's size stream.
    let base = if name_in_storage != nested_storage_name
        && path.len() == 1
        && path[0].kind == SubstreamType::ArraySizes
    {
        escape_for_file_name(nested_storage_name)
    } else {
        escape_for_file_name(name_in_storage)
    };
    name_for_substream_path(base, path, true)
}

pub fn file_name_for_column(column: &NameAndType, path: &[Substream]) -> String {
    file_name_for_stream(column.name_in_storage(), path)
}

/// The logical subcolumn name of the whole `path`, e.g. `size0`, `key.null`.
pub fn subcolumn_name_for_stream(path: &[Substream]) -> String {
    subcolumn_name_for_stream_prefix(path, path.len())
}

/// The logical subcolumn name of the first `prefix_len` steps of `path`.
pub fn subcolumn_name_for_stream_prefix(path: &[Substream], prefix_len: usize) -> String {
    let prefix_len = prefix_len.min(path.len());
    let mut name = name_for_substream_path(String::new(), &path[..prefix_len], false);
    if !name.is_empty() {
        // Every segment starts with a dot.
        name.remove(0);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::SubstreamPath;
    use hashbrown::HashMap;
    use rand::Rng;

    fn path(steps: &[&str]) -> SubstreamPath {
        steps.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_escape_for_file_name() {
        assert_eq!(escape_for_file_name("abc_XYZ_019"), "abc_XYZ_019");
        assert_eq!(escape_for_file_name("a.b"), "a%2Eb");
        assert_eq!(escape_for_file_name("a b/c"), "a%20b%2Fc");
        assert_eq!(escape_for_file_name("é"), "%C3%A9");
        assert_eq!(unescape_for_file_name("%C3%A9x%2E"), "éx.");
        assert_eq!(unescape_for_file_name("50%"), "50%");
    }

    #[test]
    fn test_extract_table_name() {
        assert_eq!(extract_table_name("n.a"), "n");
        assert_eq!(extract_table_name("n.a.b"), "n");
        assert_eq!(extract_table_name("plain"), "plain");
        assert_eq!(extract_table_name(".a"), ".a");
        assert_eq!(extract_table_name("a."), "a.");
    }

    #[test]
    fn test_stream_names_per_step() {
        assert_eq!(file_name_for_stream("col", &[]), "col");
        assert_eq!(file_name_for_stream("col", &path(&["NullMap"])), "col.null");
        assert_eq!(file_name_for_stream("col", &path(&["ArraySizes"])), "col.size0");
        assert_eq!(
            file_name_for_stream("col", &path(&["ArrayElements", "ArrayElements", "ArraySizes"])),
            "col.size2"
        );
        assert_eq!(
            file_name_for_stream("col", &path(&["DictionaryKeys", "Regular"])),
            "col.dict"
        );
        assert_eq!(file_name_for_stream("col", &path(&["SparseOffsets"])), "col.sparse.idx");
        assert_eq!(
            file_name_for_stream("col", &path(&["ArrayElements", "TupleElement:key", "Regular"])),
            "col%2Ekey"
        );
        assert_eq!(
            file_name_for_stream("col", &path(&["TupleElement:a b:noescape", "NullMap"])),
            "col.a%20b.null"
        );
    }

    #[test]
    fn test_nested_group_shares_size_stream() {
        assert_eq!(file_name_for_stream("n.a", &path(&["ArraySizes"])), "n.size0");
        assert_eq!(file_name_for_stream("n.b", &path(&["ArraySizes"])), "n.size0");
        // Any other shape keeps the full name.
        assert_eq!(
            file_name_for_stream("n.a", &path(&["ArrayElements", "ArraySizes"])),
            "n%2Ea.size1"
        );
        assert_eq!(file_name_for_stream("n.a", &path(&["NullMap"])), "n%2Ea.null");
        assert_eq!(
            file_name_for_column(&NameAndType::subcolumn("n.a", "size0", crate::types::DataType::UInt64), &path(&["ArraySizes"])),
            "n.size0"
        );
    }

    #[test]
    fn test_subcolumn_names() {
        assert_eq!(subcolumn_name_for_stream(&[]), "");
        assert_eq!(subcolumn_name_for_stream(&path(&["ArraySizes"])), "size0");
        let p = path(&["ArrayElements", "TupleElement:key", "NullMap"]);
        assert_eq!(subcolumn_name_for_stream(&p), "key.null");
        assert_eq!(subcolumn_name_for_stream_prefix(&p, 2), "key");
        assert_eq!(subcolumn_name_for_stream_prefix(&p, 1), "");
        assert_eq!(subcolumn_name_for_stream(&path(&["TupleElement:a.b"])), "a%2Eb");
    }

    #[test]
    fn test_random_structural_paths_never_collide() {
        // Arrange: random paths over {TupleElement, ArraySizes, NullMap} with
        // consistent escape flags, keyed by their structure.
        let mut rng = rand::rng();
        let fields = ["a", "b", "key", "value"];
        let mut seen: HashMap<String, Vec<String>> = HashMap::new();

        for _ in 0..2000 {
            let len = rng.random_range(1..5);
            let steps: Vec<String> = (0..len)
                .map(|_| match rng.random_range(0..3) {
                    0 => format!("TupleElement:{}", fields[rng.random_range(0..fields.len())]),
                    1 => "ArraySizes".to_string(),
                    _ => "NullMap".to_string(),
                })
                .collect();
            let refs: Vec<&str> = steps.iter().map(String::as_str).collect();

            // Act
            let name = subcolumn_name_for_stream(&path(&refs));

            // Assert
            let structure = seen.entry(name.clone()).or_insert_with(|| steps.clone());
            assert_eq!(structure, &steps, "two paths share the name {}", name);
        }
    }
}
