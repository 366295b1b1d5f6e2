// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! VoxMonitor — logging and metrics.
//!
//! A process-wide `SysLogger` behind a `OnceLock` (no sink until one of
//! the `init_monitor` variants attaches one) plus per-index atomic
//! counters.

pub mod metrics;
pub mod syslog;

pub use metrics::{IndexMetrics, MetricsSnapshot};
pub use syslog::{FileSink, LogLevel, LogSink, SysLogger, WriterSink};

use crate::voxtree::voxstream::VoxResult;
use std::sync::{Mutex, OnceLock};

static MONITOR: OnceLock<Mutex<SysLogger>> = OnceLock::new();

/// Initialises the process-wide logger appending to
/// `.voxtree/monitor.log`. First call wins; later calls are ignored.
pub fn init_monitor(min_level: LogLevel) -> VoxResult<()> {
    let logger = SysLogger::to_file(min_level)?;
    let _ = MONITOR.set(Mutex::new(logger));
    Ok(())
}

/// Initialises the process-wide logger with a caller-supplied sink.
pub fn init_monitor_with_sink(min_level: LogLevel, sink: Box<dyn LogSink>) {
    let _ = MONITOR.set(Mutex::new(SysLogger::with_sink(min_level, sink)));
}

/// Logs through the process-wide logger; a no-op before `init_monitor`.
pub fn log(level: LogLevel, message: &str) {
    if let Some(monitor) = MONITOR.get() {
        if let Ok(mut logger) = monitor.lock() {
            logger.log(level, message);
        }
    }
}

/// Logs a metric record through the process-wide logger.
pub fn log_metric(metric_type: &str, name: &str, value: &str) {
    if let Some(monitor) = MONITOR.get() {
        if let Ok(mut logger) = monitor.lock() {
            logger.log_metric(metric_type, name, value);
        }
    }
}

#[cfg(test)]
mod metrics_test;
