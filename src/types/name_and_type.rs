use super::DataType;
use serde::{Deserialize, Serialize};

/// A named column, or a named subcolumn of a column in storage.
///
/// Streams are always named after the column in storage, so a subcolumn such as
/// `m.key` reads the streams of `m`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NameAndType {
    name_in_storage: String,
    subcolumn_name: Option<String>,
    pub data_type: DataType,
}

impl NameAndType {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name_in_storage: name.into(),
            subcolumn_name: None,
            data_type,
        }
    }

    pub fn subcolumn(
        name_in_storage: impl Into<String>,
        subcolumn_name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            name_in_storage: name_in_storage.into(),
            subcolumn_name: Some(subcolumn_name.into()),
            data_type,
        }
    }

    pub fn name_in_storage(&self) -> &str {
        &self.name_in_storage
    }

    pub fn subcolumn_name(&self) -> Option<&str> {
        self.subcolumn_name.as_deref()
    }

    pub fn is_subcolumn(&self) -> bool {
        self.subcolumn_name.is_some()
    }

    /// `storage.subcolumn` for subcolumns, the storage name otherwise.
    pub fn full_name(&self) -> String {
        match &self.subcolumn_name {
            Some(sub) => format!("{}.{}", self.name_in_storage, sub),
            None => self.name_in_storage.clone(),
        }
    }
}
