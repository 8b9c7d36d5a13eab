//! Tracing setup. stdout carries the UCI protocol, so logs go to stderr or a file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

/// Switches debug logging on or off at runtime.
pub type DebugToggle = Arc<dyn Fn(bool) + Send + Sync>;

const DEBUG_FILTER: &str = "debug";

fn directive(debug: bool, base: &str) -> &str {
    if debug {
        DEBUG_FILTER
    } else {
        base
    }
}

fn filter_for(debug: bool, base: &str) -> EnvFilter {
    EnvFilter::try_new(directive(debug, base)).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. `filter` is the directive used while the
/// Debug option is off.
pub fn init(filter: &str, log_file: Option<&Path>) -> anyhow::Result<DebugToggle> {
    let base = filter.to_string();
    let (filter_layer, handle) = reload::Layer::new(filter_for(false, &base));

    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    let toggle: DebugToggle = Arc::new(move |enabled| {
        match handle.reload(filter_for(enabled, &base)) {
            Ok(()) => info!(debug = enabled, "Log level changed"),
            Err(e) => warn!(error = %e, "Failed to change log level"),
        }
    });
    Ok(toggle)
}
