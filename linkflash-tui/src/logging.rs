//! File logger
//!
//! The terminal belongs to the UI, so diagnostics go to a log file through
//! the `log` facade. Each record is one line:
//!
//! ```text
//! [1760601600.123] INFO  linkflash_host::orchestrator: flash sequence started for /dev/ttyUSB0
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use linkflash_host::Settings;
use log::{LevelFilter, Log, Metadata, Record};

use crate::error::AppError;

/// Logger writing formatted records to any writer
pub struct FileLogger<W> {
    out: Mutex<W>,
    level: LevelFilter,
}

impl<W: Write + Send> FileLogger<W> {
    pub fn new(out: W, level: LevelFilter) -> Self {
        Self {
            out: Mutex::new(out),
            level,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Log for FileLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(
                out,
                "[{}.{:03}] {:<5} {}: {}",
                now.as_secs(),
                now.subsec_millis(),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut out) = self.out.lock() {
            let _ = out.flush();
        }
    }
}

/// Install the file logger described by `settings`
///
/// Does nothing when no log file is configured.
pub fn init(settings: &Settings) -> Result<(), AppError> {
    let Some(path) = settings.log_path() else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| AppError::LogFile { path, source })?;

    let level = settings.level_filter();
    log::set_boxed_logger(Box::new(FileLogger::new(file, level)))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn emit(logger: &FileLogger<Vec<u8>>, level: Level, msg: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("linkflash_host::orchestrator")
                .args(format_args!("{msg}"))
                .build(),
        );
    }

    #[test]
    fn test_format_and_filter() {
        let logger = FileLogger::new(Vec::new(), LevelFilter::Info);
        emit(&logger, Level::Info, "flash sequence started");
        emit(&logger, Level::Debug, "dropped");
        emit(&logger, Level::Error, "build failed");

        let text = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] INFO  linkflash_host::orchestrator: flash sequence started"));
        assert!(lines[1].ends_with("] ERROR linkflash_host::orchestrator: build failed"));
    }

    #[test]
    fn test_off_disables() {
        let logger = FileLogger::new(Vec::new(), LevelFilter::Off);
        emit(&logger, Level::Error, "nothing");
        assert!(logger.into_inner().is_empty());
    }
}
