use super::creator::SubcolumnCreator;
use super::SerializationPtr;
use crate::column::ColumnPtr;
use crate::types::DataType;

/// What is known about the node a path step leads to. Every part is optional:
/// shape-only traversals carry no column, and the root step of a reconstructed
/// subcolumn carries no creator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstreamData {
    pub data_type: Option<DataType>,
    pub column: Option<ColumnPtr>,
    pub serialization: Option<SerializationPtr>,
    pub creator: Option<SubcolumnCreator>,
}

impl SubstreamData {
    pub fn new(serialization: SerializationPtr) -> Self {
        Self {
            serialization: Some(serialization),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, data_type: Option<DataType>) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_column(mut self, column: Option<ColumnPtr>) -> Self {
        self.column = column;
        self
    }

    pub fn with_creator(mut self, creator: SubcolumnCreator) -> Self {
        self.creator = Some(creator);
        self
    }
}
