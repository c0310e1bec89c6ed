//! Pure predicates over paths.

use super::{Substream, SubstreamType};

/// Whether the stream at `path` may use content-aware compression.
///
/// Null maps, array sizes, dictionary indexes and sparse offsets are dense
/// structural streams; only generic byte-level compression applies to them.
pub fn is_special_compression_allowed(path: &[Substream]) -> bool {
    !path.iter().any(|step| {
        matches!(
            step.kind,
            SubstreamType::NullMap
                | SubstreamType::ArraySizes
                | SubstreamType::DictionaryIndexes
                | SubstreamType::SparseOffsets
        )
    })
}

/// Whether the first `prefix_len` steps of `path` name a subcolumn
/// (`col.null`, `col.field`, `col.size0`).
pub fn has_subcolumn_for_path(path: &[Substream], prefix_len: usize) -> bool {
    if prefix_len == 0 || prefix_len > path.len() {
        return false;
    }
    matches!(
        path[prefix_len - 1].kind,
        SubstreamType::NullMap | SubstreamType::TupleElement | SubstreamType::ArraySizes
    )
}

/// The array nesting depth of `path`.
pub fn get_array_level(path: &[Substream]) -> usize {
    path.iter()
        .filter(|step| step.kind == SubstreamType::ArrayElements)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::SubstreamPath;

    fn path(kinds: &[SubstreamType]) -> SubstreamPath {
        kinds.iter().map(|&k| Substream::new(k)).collect()
    }

    #[test]
    fn test_special_compression_excludes_structural_streams() {
        assert!(is_special_compression_allowed(&[]));
        assert!(is_special_compression_allowed(&path(&[
            SubstreamType::Regular,
            SubstreamType::ArrayElements,
            SubstreamType::TupleElement,
            SubstreamType::DictionaryKeys,
        ])));

        for blocked in [
            SubstreamType::NullMap,
            SubstreamType::ArraySizes,
            SubstreamType::DictionaryIndexes,
            SubstreamType::SparseOffsets,
        ] {
            let p = path(&[SubstreamType::ArrayElements, blocked, SubstreamType::Regular]);
            assert!(!is_special_compression_allowed(&p), "{} allowed", p);
        }
    }

    #[test]
    fn test_has_subcolumn_depends_only_on_the_last_prefix_step() {
        let p = path(&[
            SubstreamType::ArrayElements,
            SubstreamType::TupleElement,
            SubstreamType::NullMap,
        ]);
        assert!(!has_subcolumn_for_path(&p, 0));
        assert!(!has_subcolumn_for_path(&p, 1));
        assert!(has_subcolumn_for_path(&p, 2));
        assert!(has_subcolumn_for_path(&p, 3));
        assert!(!has_subcolumn_for_path(&p, 4));

        for kind in SubstreamType::ALL {
            let expected = matches!(
                kind,
                SubstreamType::NullMap | SubstreamType::TupleElement | SubstreamType::ArraySizes
            );
            let p = path(&[SubstreamType::DictionaryKeys, kind]);
            assert_eq!(has_subcolumn_for_path(&p, 2), expected, "{:?}", kind);
        }
    }

    #[test]
    fn test_array_level_counts_elements_steps() {
        assert_eq!(get_array_level(&[]), 0);
        let p = path(&[
            SubstreamType::ArrayElements,
            SubstreamType::NullableElements,
            SubstreamType::ArrayElements,
            SubstreamType::ArraySizes,
        ]);
        assert_eq!(get_array_level(&p), 2);
    }
}
