// In: src/ffi/python.rs

use log::LevelFilter;
use pyo3::prelude::*;
use std::fs::OpenOptions;
use std::sync::Once;

use crate::error::TambakError;
use crate::serialization::{
    self, file_name_for_stream, subcolumn_name_for_stream, Substream, SubstreamPath,
};
use crate::types::DataType;

fn parse_path(steps: &[String]) -> Result<SubstreamPath, TambakError> {
    steps.iter().map(|step| step.parse::<Substream>()).collect()
}

//==================================================================================
// I. Naming API
//==================================================================================

/// Physical stream name of `column` at `steps`, e.g.
/// `stream_name("m", ["ArrayElements", "TupleElement:key"]) == "m%2Ekey"`.
#[pyfunction]
#[pyo3(name = "stream_name")]
pub fn stream_name_py(column: &str, steps: Vec<String>) -> PyResult<String> {
    let path = parse_path(&steps)?;
    Ok(file_name_for_stream(column, &path))
}

/// Logical subcolumn name of `steps`, e.g. `size0` or `key.null`.
#[pyfunction]
#[pyo3(name = "subcolumn_name")]
pub fn subcolumn_name_py(steps: Vec<String>) -> PyResult<String> {
    let path = parse_path(&steps)?;
    Ok(subcolumn_name_for_stream(&path))
}

#[pyfunction]
#[pyo3(name = "is_special_compression_allowed")]
pub fn is_special_compression_allowed_py(steps: Vec<String>) -> PyResult<bool> {
    let path = parse_path(&steps)?;
    Ok(serialization::is_special_compression_allowed(&path))
}

/// Lists the streams of a column of type `type_name` in enumeration order, as
/// `(stream name, subcolumn name, special compression allowed)` tuples. Stream
/// names are relative to a column named `column`.
#[pyfunction]
#[pyo3(name = "describe_streams", signature = (type_name, column = "c"))]
pub fn describe_streams_py(type_name: &str, column: &str) -> PyResult<Vec<(String, String, bool)>> {
    let data_type: DataType = type_name.parse()?;
    let root = data_type.default_serialization()?;
    let mut streams = Vec::new();
    root.enumerate_streams(
        &mut SubstreamPath::new(),
        &mut |path: &SubstreamPath| {
            streams.push((
                file_name_for_stream(column, path),
                subcolumn_name_for_stream(path),
                serialization::is_special_compression_allowed(path),
            ))
        },
        Some(&data_type),
        None,
    );
    Ok(streams)
}

//==================================================================================
// II. Logging
//==================================================================================

static INIT_LOGGER: Once = Once::new();

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    let file = match log_file {
        Some(filename) => Some(OpenOptions::new().append(true).create(true).open(filename)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
