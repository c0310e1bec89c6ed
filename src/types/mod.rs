//! This module defines the core, strongly-typed logical types used throughout
//! the substream engine.
//!
//! It currently includes the canonical `DataType` enum, its textual form
//! (`Array(Tuple(key String, value UInt32))`), its Arrow mapping and the
//! `NameAndType` pair used to name streams.

pub mod data_type;
pub mod name_and_type;

// Re-export the main type(s) for easier access.
pub use data_type::{DataType, TupleField};
pub use name_and_type::NameAndType;
