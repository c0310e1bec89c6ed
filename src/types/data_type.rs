//! This module defines the canonical, type-safe representation of logical column
//! types understood by the substream engine.

use crate::error::TambakError;
use arrow_schema::{DataType as ArrowDataType, Field, Fields};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The logical type of a column.
///
/// Leaf variants map to exactly one physical stream. Composite variants
/// (`Array`, `Tuple`, `Nullable`, `LowCardinality`) decompose into several
/// streams, one per structural substream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Array(Box<DataType>),
    Tuple(Vec<TupleField>),
    Nullable(Box<DataType>),
    LowCardinality(Box<DataType>),
}

/// One named element of a `Tuple` type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleField {
    pub name: String,
    pub data_type: DataType,
}

impl TupleField {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl DataType {
    pub fn array(nested: DataType) -> Self {
        DataType::Array(Box::new(nested))
    }

    pub fn nullable(nested: DataType) -> Self {
        DataType::Nullable(Box::new(nested))
    }

    pub fn low_cardinality(nested: DataType) -> Self {
        DataType::LowCardinality(Box::new(nested))
    }

    /// Builds a tuple from `(name, type)` pairs.
    pub fn tuple<N: Into<String>>(fields: impl IntoIterator<Item = (N, DataType)>) -> Self {
        DataType::Tuple(
            fields
                .into_iter()
                .map(|(name, data_type)| TupleField::new(name, data_type))
                .collect(),
        )
    }

    /// Returns the byte width of a fixed-width leaf type, or `None`.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::UInt8 | Self::Int8 => Some(1),
            Self::UInt16 | Self::Int16 => Some(2),
            Self::UInt32 | Self::Int32 | Self::Float32 => Some(4),
            Self::UInt64 | Self::Int64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Returns `true` for the types a `Nullable` may wrap: numbers and strings.
    pub fn can_be_inside_nullable(&self) -> bool {
        !self.is_composite()
    }

    /// Returns `true` if values of this type are spread over several streams.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Self::Array(_) | Self::Tuple(_) | Self::Nullable(_) | Self::LowCardinality(_)
        )
    }

    //==============================================================================
    // Arrow interop
    //==============================================================================

    /// Converts an Arrow field into a `DataType`, wrapping nullable fields.
    pub fn from_arrow_field(field: &Field) -> Result<Self, TambakError> {
        let inner = Self::from_arrow_type(field.data_type())?;
        // Only leaf values can be null. Nullable lists and structs are read as
        // non-nullable; their null slots become defaults.
        if field.is_nullable() && inner.can_be_inside_nullable() {
            Ok(Self::nullable(inner))
        } else {
            Ok(inner)
        }
    }

    /// Converts an Arrow `DataType` into a non-nullable `DataType`.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, TambakError> {
        match arrow_type {
            ArrowDataType::Int8 => Ok(Self::Int8),
            ArrowDataType::Int16 => Ok(Self::Int16),
            ArrowDataType::Int32 => Ok(Self::Int32),
            ArrowDataType::Int64 => Ok(Self::Int64),
            ArrowDataType::UInt8 => Ok(Self::UInt8),
            ArrowDataType::UInt16 => Ok(Self::UInt16),
            ArrowDataType::UInt32 => Ok(Self::UInt32),
            ArrowDataType::UInt64 => Ok(Self::UInt64),
            ArrowDataType::Float32 => Ok(Self::Float32),
            ArrowDataType::Float64 => Ok(Self::Float64),
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => Ok(Self::String),
            ArrowDataType::List(field) | ArrowDataType::LargeList(field) => {
                Ok(Self::array(Self::from_arrow_field(field)?))
            }
            ArrowDataType::Struct(fields) => Ok(DataType::Tuple(
                fields
                    .iter()
                    .map(|f| Ok(TupleField::new(f.name().clone(), Self::from_arrow_field(f)?)))
                    .collect::<Result<Vec<_>, TambakError>>()?,
            )),
            ArrowDataType::Dictionary(key, value) if **key == ArrowDataType::UInt32 => {
                Ok(Self::low_cardinality(Self::from_arrow_type(value)?))
            }
            dt => Err(TambakError::UnsupportedType(format!(
                "Cannot convert Arrow type {:?} to DataType",
                dt
            ))),
        }
    }

    /// Converts this type into an Arrow field. `Nullable` becomes the field's
    /// nullability flag.
    pub fn to_arrow_field(&self, name: &str) -> Field {
        match self {
            Self::Nullable(nested) => Field::new(name, nested.to_arrow_type(), true),
            other => Field::new(name, other.to_arrow_type(), false),
        }
    }

    /// Converts this type into an Arrow `DataType`, ignoring top-level nullability.
    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::Int8 => ArrowDataType::Int8,
            Self::Int16 => ArrowDataType::Int16,
            Self::Int32 => ArrowDataType::Int32,
            Self::Int64 => ArrowDataType::Int64,
            Self::UInt8 => ArrowDataType::UInt8,
            Self::UInt16 => ArrowDataType::UInt16,
            Self::UInt32 => ArrowDataType::UInt32,
            Self::UInt64 => ArrowDataType::UInt64,
            Self::Float32 => ArrowDataType::Float32,
            Self::Float64 => ArrowDataType::Float64,
            Self::String => ArrowDataType::Utf8,
            Self::Array(nested) => ArrowDataType::LargeList(Arc::new(nested.to_arrow_field("item"))),
            Self::Tuple(fields) => ArrowDataType::Struct(Fields::from(
                fields
                    .iter()
                    .map(|f| f.data_type.to_arrow_field(&f.name))
                    .collect::<Vec<_>>(),
            )),
            Self::Nullable(nested) => nested.to_arrow_type(),
            Self::LowCardinality(nested) => ArrowDataType::Dictionary(
                Box::new(ArrowDataType::UInt32),
                Box::new(nested.to_arrow_type()),
            ),
        }
    }
}

/// Provides the canonical string representation, e.g. `Array(Tuple(key String, value UInt32))`.
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(nested) => write!(f, "Array({})", nested),
            Self::Nullable(nested) => write!(f, "Nullable({})", nested),
            Self::LowCardinality(nested) => write!(f, "LowCardinality({})", nested),
            Self::Tuple(fields) => {
                write!(f, "Tuple(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", field.name, field.data_type)?;
                }
                write!(f, ")")
            }
            leaf => write!(f, "{:?}", leaf),
        }
    }
}

impl FromStr for DataType {
    type Err = TambakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { input: s, pos: 0 };
        let data_type = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(data_type)
    }
}

//==================================================================================
// Type-name parser
//==================================================================================

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self, reason: &str) -> TambakError {
        TambakError::TypeParseError {
            input: self.input.to_string(),
            reason: format!("{} at offset {}", reason, self.pos),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), TambakError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn ident(&mut self) -> Result<&'a str, TambakError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn parse_type(&mut self) -> Result<DataType, TambakError> {
        let name = self.ident()?;
        let leaf = match name {
            "UInt8" => Some(DataType::UInt8),
            "UInt16" => Some(DataType::UInt16),
            "UInt32" => Some(DataType::UInt32),
            "UInt64" => Some(DataType::UInt64),
            "Int8" => Some(DataType::Int8),
            "Int16" => Some(DataType::Int16),
            "Int32" => Some(DataType::Int32),
            "Int64" => Some(DataType::Int64),
            "Float32" => Some(DataType::Float32),
            "Float64" => Some(DataType::Float64),
            "String" => Some(DataType::String),
            _ => None,
        };
        if let Some(leaf) = leaf {
            return Ok(leaf);
        }

        self.expect(b'(')?;
        let parsed = match name {
            "Array" => DataType::array(self.parse_type()?),
            "Nullable" => DataType::nullable(self.parse_type()?),
            "LowCardinality" => DataType::low_cardinality(self.parse_type()?),
            "Tuple" => DataType::Tuple(self.parse_tuple_fields()?),
            other => return Err(self.error(&format!("unknown type '{}'", other))),
        };
        self.expect(b')')?;
        Ok(parsed)
    }

    /// Elements are either `name Type` or a bare `Type`; bare elements are
    /// named by their 1-based position.
    fn parse_tuple_fields(&mut self) -> Result<Vec<TupleField>, TambakError> {
        let mut fields = Vec::new();
        loop {
            let checkpoint = self.pos;
            let first = self.ident()?;
            self.skip_ws();
            let field = match self.peek() {
                Some(b',') | Some(b')') | Some(b'(') => {
                    self.pos = checkpoint;
                    TupleField::new((fields.len() + 1).to_string(), self.parse_type()?)
                }
                _ => TupleField::new(first, self.parse_type()?),
            };
            fields.push(field);

            self.skip_ws();
            if self.peek() == Some(b',') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(fields)
    }
}
