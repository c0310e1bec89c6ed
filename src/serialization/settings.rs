//! Stream-getter capabilities and the settings threaded through bulk calls.

use super::{Substream, SubstreamPath};
use crate::column::Column;
use hashbrown::HashMap;
use std::io::{Read, Write};

/// Supplies the output stream for a path, or `None` when the destination does
/// not want that stream.
pub trait OutputStreamGetter {
    fn output_stream(&mut self, path: &SubstreamPath) -> Option<&mut dyn Write>;
}

/// Supplies the input stream for a path, or `None` when it is not available.
pub trait InputStreamGetter {
    fn input_stream(&mut self, path: &SubstreamPath) -> Option<&mut dyn Read>;
}

pub struct SerializeBinaryBulkSettings<'a> {
    pub path: SubstreamPath,
    pub getter: &'a mut dyn OutputStreamGetter,
}

impl<'a> SerializeBinaryBulkSettings<'a> {
    pub fn new(getter: &'a mut dyn OutputStreamGetter) -> Self {
        Self {
            path: SubstreamPath::new(),
            getter,
        }
    }

    /// The stream for the current path.
    pub fn stream(&mut self) -> Option<&mut dyn Write> {
        self.getter.output_stream(&self.path)
    }

    /// Runs `f` with `step` pushed onto the path; the step is popped afterwards.
    pub fn scoped<T>(&mut self, step: impl Into<Substream>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(step);
        let result = f(self);
        self.path.pop();
        result
    }
}

/// Rows of a dictionary block that an earlier read call did not consume.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingDictionaryBlock {
    /// All keys of the block.
    pub keys: Column,
    /// Block-local indexes of the rows still to be read.
    pub indexes: Vec<u32>,
}

/// What one bulk read leaves behind for the next read of the same streams.
///
/// A `LowCardinality` block longer than the rows a call asks for is split: the
/// call takes what it needs and the rest waits here, keyed by the path of the
/// `LowCardinality` node.
#[derive(Debug, Default)]
pub struct DeserializeBinaryBulkState {
    dictionary_blocks: HashMap<String, PendingDictionaryBlock>,
}

impl DeserializeBinaryBulkState {
    /// True if some block still holds rows that no call has read yet.
    pub fn has_pending_rows(&self) -> bool {
        !self.dictionary_blocks.is_empty()
    }

    pub(crate) fn take_dictionary_block(&mut self, path: &str) -> Option<PendingDictionaryBlock> {
        self.dictionary_blocks.remove(path)
    }

    pub(crate) fn keep_dictionary_block(&mut self, path: String, block: PendingDictionaryBlock) {
        self.dictionary_blocks.insert(path, block);
    }
}

/// Settings for bulk reads. Reuse one value across the calls that read a column
/// so that its `state` carries over.
pub struct DeserializeBinaryBulkSettings<'a> {
    pub path: SubstreamPath,
    pub getter: &'a mut dyn InputStreamGetter,
    /// Average size of one value in bytes, a non-binding allocation hint.
    pub avg_value_size_hint: f64,
    pub state: DeserializeBinaryBulkState,
}

impl<'a> DeserializeBinaryBulkSettings<'a> {
    pub fn new(getter: &'a mut dyn InputStreamGetter) -> Self {
        Self {
            path: SubstreamPath::new(),
            getter,
            avg_value_size_hint: 0.0,
            state: DeserializeBinaryBulkState::default(),
        }
    }

    pub fn with_avg_value_size_hint(mut self, hint: f64) -> Self {
        self.avg_value_size_hint = hint;
        self
    }

    /// The stream for the current path.
    pub fn stream(&mut self) -> Option<&mut dyn Read> {
        self.getter.input_stream(&self.path)
    }

    /// Runs `f` with `step` pushed onto the path; the step is popped afterwards.
    pub fn scoped<T>(&mut self, step: impl Into<Substream>, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(step);
        let result = f(self);
        self.path.pop();
        result
    }
}
