//! This file is the root of the `tambak_substreams` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`serialization`, `kernels`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the types most callers need.
//! 3.  Defining the `#[pymodule]` which acts as the main entry point when the
//!     compiled library is imported into Python (feature `python`).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod codec;
pub mod column;
pub mod config;
pub mod error;
pub mod kernels;
pub mod null_handling;
pub mod serialization;
pub mod streams;
pub mod subcolumns;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

pub use column::{Column, ColumnPtr};
pub use config::TambakConfig;
pub use error::TambakError;
pub use serialization::{Serialization, SerializationPtr, Substream, SubstreamPath, SubstreamType};
pub use streams::{ColumnStreams, MemoryStreamStore};
pub use types::{DataType, NameAndType};

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `tambak_substreams` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn tambak_substreams(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // --- Naming ---
    m.add_function(wrap_pyfunction!(ffi::python::stream_name_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::subcolumn_name_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::is_special_compression_allowed_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::describe_streams_py, m)?)?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    // --- Turn on engine logging ---
    m.add_function(wrap_pyfunction!(ffi::python::enable_verbose_logging_py, m)?)?;

    Ok(())
}
