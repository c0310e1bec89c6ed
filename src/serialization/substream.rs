//! One structural step of a decomposition path.

use super::data::SubstreamData;
use crate::error::TambakError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of structural step taken when descending into a column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubstreamType {
    Regular,
    NullMap,
    NullableElements,
    ArraySizes,
    ArrayElements,
    TupleElement,
    DictionaryKeys,
    DictionaryIndexes,
    SparseOffsets,
    SparseElements,
}

impl SubstreamType {
    pub const ALL: [SubstreamType; 10] = [
        SubstreamType::Regular,
        SubstreamType::NullMap,
        SubstreamType::NullableElements,
        SubstreamType::ArraySizes,
        SubstreamType::ArrayElements,
        SubstreamType::TupleElement,
        SubstreamType::DictionaryKeys,
        SubstreamType::DictionaryIndexes,
        SubstreamType::SparseOffsets,
        SubstreamType::SparseElements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubstreamType::Regular => "Regular",
            SubstreamType::NullMap => "NullMap",
            SubstreamType::NullableElements => "NullableElements",
            SubstreamType::ArraySizes => "ArraySizes",
            SubstreamType::ArrayElements => "ArrayElements",
            SubstreamType::TupleElement => "TupleElement",
            SubstreamType::DictionaryKeys => "DictionaryKeys",
            SubstreamType::DictionaryIndexes => "DictionaryIndexes",
            SubstreamType::SparseOffsets => "SparseOffsets",
            SubstreamType::SparseElements => "SparseElements",
        }
    }
}

/// A path step. `tuple_element_name` and `escape_tuple_delimiter` are only
/// meaningful for `TupleElement`.
#[derive(Debug, Clone, PartialEq)]
pub struct Substream {
    pub kind: SubstreamType,
    pub tuple_element_name: String,
    pub escape_tuple_delimiter: bool,
    pub data: SubstreamData,
}

impl Substream {
    pub fn new(kind: SubstreamType) -> Self {
        Self {
            kind,
            tuple_element_name: String::new(),
            escape_tuple_delimiter: true,
            data: SubstreamData::default(),
        }
    }

    pub fn tuple_element(name: impl Into<String>, escape_tuple_delimiter: bool) -> Self {
        Self {
            kind: SubstreamType::TupleElement,
            tuple_element_name: name.into(),
            escape_tuple_delimiter,
            data: SubstreamData::default(),
        }
    }

    pub fn with_data(mut self, data: SubstreamData) -> Self {
        self.data = data;
        self
    }
}

impl From<SubstreamType> for Substream {
    fn from(kind: SubstreamType) -> Self {
        Substream::new(kind)
    }
}

impl fmt::Display for Substream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == SubstreamType::TupleElement {
            return write!(
                f,
                "TupleElement({}, escape_tuple_delimiter={})",
                self.tuple_element_name, self.escape_tuple_delimiter
            );
        }
        f.write_str(self.kind.as_str())
    }
}

/// Parses a short step descriptor: a kind name such as `ArraySizes`, or
/// `TupleElement:<name>` with an optional `:noescape` suffix.
impl FromStr for Substream {
    type Err = TambakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, ':');
        let kind_name = parts.next().unwrap_or_default();
        let kind = SubstreamType::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == kind_name)
            .ok_or_else(|| TambakError::InvalidSubstream(format!("unknown step '{}'", s)))?;

        if kind != SubstreamType::TupleElement {
            return match parts.next() {
                None => Ok(Substream::new(kind)),
                Some(_) => Err(TambakError::InvalidSubstream(format!(
                    "step '{}' takes no arguments",
                    kind_name
                ))),
            };
        }

        let name = parts
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TambakError::InvalidSubstream(format!("'{}' needs a field name", s)))?;
        let escape = match parts.next() {
            None => true,
            Some("noescape") => false,
            Some(flag) => {
                return Err(TambakError::InvalidSubstream(format!(
                    "unknown tuple element flag '{}'",
                    flag
                )))
            }
        };
        Ok(Substream::tuple_element(name, escape))
    }
}
