//! Structured diagnostics for the substream engine.
//!
//! The `log_metric!` macro emits one key/value record per event through the
//! `log` facade at debug level. The `#[cfg(debug_assertions)]` attribute
//! compiles the macro body out of release builds.

/// Logs a structured key-value metric record, only in debug builds.
///
/// # Example
/// ```
/// use tambak_substreams::log_metric;
/// let streams = 3;
/// log_metric!("event"="serialize_column", "column"="m", "streams"=&streams);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+

            log::debug!("TAMBAK_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

/// Routes `log` output to the test harness. Safe to call from every test.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
