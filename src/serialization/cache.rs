//! The per-call substream cache.
//!
//! Distinct logical subcolumns can resolve to one physical stream (every element
//! of an array of tuples shares the array's sizes). Within one read call the
//! cache makes sure such a stream is decoded once.

use super::naming::subcolumn_name_for_stream;
use super::Substream;
use crate::column::ColumnPtr;
use hashbrown::HashMap;

/// Columns keyed by logical subcolumn name.
#[derive(Debug, Default, Clone)]
pub struct SubstreamsCache {
    columns: HashMap<String, ColumnPtr>,
}

impl SubstreamsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subcolumn_name: &str) -> Option<&ColumnPtr> {
        self.columns.get(subcolumn_name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cached subcolumn names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Stores `column` under the subcolumn name of `path`, replacing any earlier
/// entry. Does nothing without a cache or for the empty path.
pub fn add_to_substreams_cache(
    cache: Option<&mut SubstreamsCache>,
    path: &[Substream],
    column: ColumnPtr,
) {
    if let Some(cache) = cache {
        if !path.is_empty() {
            cache.columns.insert(subcolumn_name_for_stream(path), column);
        }
    }
}

/// Looks up the subcolumn of `path`. Always absent without a cache or for the
/// empty path.
pub fn get_from_substreams_cache(
    cache: Option<&SubstreamsCache>,
    path: &[Substream],
) -> Option<ColumnPtr> {
    let cache = cache?;
    if path.is_empty() {
        return None;
    }
    cache.columns.get(&subcolumn_name_for_stream(path)).cloned()
}
