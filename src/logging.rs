use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::Result;

static SUBSCRIBER: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// One structured record describing a step of dataset assembly.
#[derive(Debug, Serialize)]
pub struct DatasetEvent<'a> {
    pub filename: &'a str,
    pub timestamp: DateTime<Utc>,
    pub component: &'a str,
    pub operation: &'a str,
    pub stage: &'a str,
    pub line_num: u32,
    pub symbol: Option<&'a str>,
    pub rows: Option<usize>,
    pub error: Option<&'a str>,
    pub message: &'a str,
}

/// Initialize a tracing subscriber emitting JSON records.
///
/// The filter defaults to `info` and honours `RUST_LOG`. Calling this function multiple
/// times is safe; only the first invocation installs the subscriber.
pub fn init_logging() -> Result<()> {
    let result = SUBSCRIBER.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(false)
            .try_init()
            .map_err(|error| error.to_string())?;

        Ok(())
    });

    match result {
        Ok(()) => Ok(()),
        Err(message) => Err(anyhow!(message.clone())),
    }
}

/// Emit a structured dataset event. Events carrying an error are logged at `warn`.
#[allow(clippy::too_many_arguments)]
pub fn log_event(
    filename: &str,
    component: &str,
    operation: &str,
    stage: &str,
    line_num: u32,
    symbol: Option<&str>,
    rows: Option<usize>,
    message: &str,
    error: Option<&str>,
) {
    let event = DatasetEvent {
        filename,
        timestamp: Utc::now(),
        component,
        operation,
        stage,
        line_num,
        symbol,
        rows,
        error,
        message,
    };

    match (serde_json::to_string(&event), error) {
        (Ok(serialized), None) => info!(target: "stockdata", json = %serialized),
        (Ok(serialized), Some(_)) => warn!(target: "stockdata", json = %serialized),
        (Err(_), None) => info!(target: "stockdata", stage, message),
        (Err(_), Some(error)) => warn!(target: "stockdata", stage, message, error),
    }
}
