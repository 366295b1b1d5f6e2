// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Syslog-style logger for VoxTree.
//!
//! One line per event in BSD syslog shape:
//!
//! ```text
//! Aug 01 14:23:01 buildhost voxtree[4711]: NOTICE: octree index initialised
//! ```
//!
//! The logger writes through a pluggable `LogSink`. The library default is
//! no sink at all — a silent logger costs one level comparison per call —
//! so embedders opt into file output or supply their own destination.

use crate::voxtree::voxstream::{VoxError, VoxResult};
use std::fs::File;
use std::io::Write;

/// RFC 5424 severities, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    EMERG = 0,
    ALERT = 1,
    CRIT = 2,
    ERROR = 3,
    WARN = 4,
    NOTICE = 5,
    INFO = 6,
    DEBUG = 7,
}

const LEVEL_NAMES: [&str; 8] = [
    "EMERG", "ALERT", "CRIT", "ERROR", "WARN", "NOTICE", "INFO", "DEBUG",
];

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        LEVEL_NAMES[*self as usize]
    }
}

/// Destination for formatted log lines.
///
/// Implementations receive complete lines without the trailing newline.
pub trait LogSink: Send {
    fn write_line(&mut self, line: &str) -> VoxResult<()>;
}

/// Appends to `.voxtree/monitor.log`, creating the directory on first
/// use.
pub struct FileSink {
    file: File,
}

impl FileSink {
    pub const LOG_PATH: &'static str = ".voxtree/monitor.log";

    /// Opens (or creates) the log file in append mode.
    ///
    /// ## Error Conditions
    /// - Directory creation or file open failure → `IoError`
    pub fn open() -> VoxResult<Self> {
        std::fs::create_dir_all(".voxtree").map_err(|e| VoxError::IoError {
            operation: "create_log_directory".to_string(),
            path: ".voxtree".to_string(),
            reason: e.to_string(),
        })?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(Self::LOG_PATH)
            .map_err(|e| VoxError::IoError {
                operation: "open_log_file".to_string(),
                path: Self::LOG_PATH.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { file })
    }
}

impl LogSink for FileSink {
    fn write_line(&mut self, line: &str) -> VoxResult<()> {
        writeln!(self.file, "{}", line).map_err(|e| VoxError::IoError {
            operation: "write_log_line".to_string(),
            path: Self::LOG_PATH.to_string(),
            reason: e.to_string(),
        })?;
        self.file.flush().map_err(|e| VoxError::IoError {
            operation: "flush_log_file".to_string(),
            path: Self::LOG_PATH.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Forwards lines to any `io::Write`; useful for embedders routing into
/// their own logging stack and for tests.
pub struct WriterSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> VoxResult<()> {
        writeln!(self.out, "{}", line).map_err(|e| VoxError::IoError {
            operation: "write_log_line".to_string(),
            path: "writer".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Syslog-format logger with level filtering.
///
/// ## Example Usage
/// ```rust
/// use voxtree::voxtree::monitor::syslog::{LogLevel, SysLogger};
///
/// let mut logger = SysLogger::silent(LogLevel::INFO);
/// logger.log(LogLevel::INFO, "index initialised");
/// logger.log_metric("counter", "inserts_total", "42");
/// ```
pub struct SysLogger {
    hostname: String,
    pid: u32,
    min_level: LogLevel,
    sink: Option<Box<dyn LogSink>>,
}

/// Process name in every line; fixed for the crate.
const IDENT: &str = "voxtree";

impl SysLogger {
    /// Logger without a sink; filters and drops everything.
    pub fn silent(min_level: LogLevel) -> Self {
        Self {
            hostname: local_hostname(),
            pid: std::process::id(),
            min_level,
            sink: None,
        }
    }

    /// Logger appending to `.voxtree/monitor.log`.
    pub fn to_file(min_level: LogLevel) -> VoxResult<Self> {
        Ok(Self::with_sink(min_level, Box::new(FileSink::open()?)))
    }

    /// Logger writing through a caller-supplied sink.
    pub fn with_sink(min_level: LogLevel, sink: Box<dyn LogSink>) -> Self {
        Self {
            hostname: local_hostname(),
            pid: std::process::id(),
            min_level,
            sink: Some(sink),
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Emits one line when `level` passes the filter and a sink is
    /// attached. Sink failures are swallowed: logging never takes an
    /// index operation down.
    pub fn log(&mut self, level: LogLevel, message: &str) {
        if level > self.min_level {
            return;
        }
        let sink = match self.sink.as_mut() {
            Some(sink) => sink,
            None => return,
        };
        let line = format!(
            "{} {} {}[{}]: {}: {}",
            bsd_timestamp(),
            self.hostname,
            IDENT,
            self.pid,
            level.as_str(),
            message
        );
        let _ = sink.write_line(&line);
    }

    /// Metric record at INFO: `METRIC[counter] inserts_total: 42`.
    pub fn log_metric(&mut self, kind: &str, name: &str, value: &str) {
        let message = format!("METRIC[{}] {}: {}", kind, name, value);
        self.log(LogLevel::INFO, &message);
    }
}

/// System hostname, falling back to `localhost`.
fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

/// BSD syslog timestamp (`Dec 15 14:23:01`).
fn bsd_timestamp() -> String {
    chrono::Local::now().format("%b %d %H:%M:%S").to_string()
}
