// Logging utilities
// Author: Gabriel Demetrios Lafis

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

use super::{AppError, AppResult};

/// Initialize logging to standard error with the given level
pub fn init_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(SimpleLogger { level, file: None }))
        .map(|()| log::set_max_level(level))
}

/// Initialize logging to an appended file with the given level
pub fn init_file_logging<P: AsRef<Path>>(level: LevelFilter, path: P) -> AppResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    log::set_boxed_logger(Box::new(SimpleLogger {
        level,
        file: Some(Mutex::new(file)),
    }))
    .map(|()| log::set_max_level(level))
    .map_err(|e| AppError::Config(e.to_string()))
}

/// Simple logger implementation
struct SimpleLogger {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        match &self.file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "[{}] {}: {}", timestamp, record.level(), record.args());
                }
            }
            None => {
                let level_str = match record.level() {
                    Level::Error => "\x1B[31mERROR\x1B[0m",
                    Level::Warn => "\x1B[33mWARN\x1B[0m",
                    Level::Info => "\x1B[32mINFO\x1B[0m",
                    Level::Debug => "\x1B[34mDEBUG\x1B[0m",
                    Level::Trace => "\x1B[90mTRACE\x1B[0m",
                };
                // stdout is reserved for printed tables
                eprintln!("[{}] {}: {}", timestamp, level_str, record.args());
            }
        }
    }

    fn flush(&self) {
        if let Some(Ok(mut file)) = self.file.as_ref().map(Mutex::lock) {
            let _ = file.flush();
        }
    }
}
