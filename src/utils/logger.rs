//! Logger utility for batch logging
//!
//! This module provides a logger that every component receives by reference.
//! It works alongside the standard log crate, adds file output and can keep
//! the formatted lines in memory so callers can inspect what was reported.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use log::{Log, Record, Level, Metadata, LevelFilter};

/// Target name used when forwarding messages to the `log` facade
const LOG_TARGET: &str = "radiokit";

/// Custom logger implementation
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    /// Captured lines, only kept when created with [`Logger::capturing`]
    captured: Option<Mutex<Vec<String>>>,
}

impl Logger {
    /// Creates a new logger instance
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be created
    pub fn new(log_file: &str) -> io::Result<Self> {
        let file = File::create(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            captured: None,
        })
    }

    /// Creates a logger that only forwards to the `log` facade
    pub fn console() -> Self {
        Logger {
            file: Mutex::new(None),
            captured: None,
        }
    }

    /// Creates a logger that keeps every formatted line in memory
    pub fn capturing() -> Self {
        Logger {
            file: Mutex::new(None),
            captured: Some(Mutex::new(Vec::new())),
        }
    }

    /// Logs a message to the log file
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log
    pub fn log(&self, message: &str) -> io::Result<()> {
        if let Some(captured) = &self.captured {
            if let Ok(mut lines) = captured.lock() {
                lines.push(message.to_string());
            }
        }

        let mut guard = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(file) = &mut *guard {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Logs a debug message
    pub fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }

    /// Logs an informational message
    pub fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    /// Logs a warning
    pub fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    /// Logs an error
    pub fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }

    /// Returns the captured lines (empty unless created with [`Logger::capturing`])
    pub fn captured(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .and_then(|c| c.lock().ok().map(|lines| lines.clone()))
            .unwrap_or_default()
    }

    /// Counts captured lines logged at the given level
    pub fn count_level(&self, level: Level) -> usize {
        let prefix = format!("[{}]", level);
        self.captured()
            .iter()
            .filter(|line| line.starts_with(&prefix))
            .count()
    }

    fn record(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{}", message);
        // Failing to write the log file must never abort a batch
        let _ = self.log(&format!("[{}] {}", level, message));
    }

    /// Static method to initialize the global logger
    pub fn init_global_logger(log_file: &str) -> io::Result<()> {
        // Create a dedicated logger for the log crate
        let global_logger = Logger::new(log_file)?;

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(LevelFilter::Debug);
        Ok(())
    }
}

// Implement the Log trait to make our Logger work with the log crate
impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.log(&message);

            if record.level() <= Level::Info {
                eprintln!("{}", message);
            }
        }
    }

    fn flush(&self) {
        // Already flushing in the log method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capturing_logger_keeps_levels() {
        let logger = Logger::capturing();
        logger.info("Starting");
        logger.warn("Skipping key foo");
        logger.warn("Skipping key bar");

        assert_eq!(logger.captured().len(), 3);
        assert_eq!(logger.count_level(Level::Warn), 2);
        assert_eq!(logger.captured()[0], "[INFO] Starting");
    }

    #[test]
    fn test_console_logger_captures_nothing() {
        let logger = Logger::console();
        logger.error("Failed");
        assert!(logger.captured().is_empty());
    }
}
