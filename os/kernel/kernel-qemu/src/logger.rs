use crate::qemu_trace;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// `log` backend writing to the QEMU debug console.
pub struct QemuLogger {
    max_level: LevelFilter,
}

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Installs this logger and sets the global filter to its level. Call once
    /// during early init.
    ///
    /// # Errors
    /// Fails if a logger is already installed.
    pub fn init(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        qemu_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn meta(level: Level) -> Metadata<'static> {
        Metadata::builder().level(level).target("kernel").build()
    }

    #[test]
    fn filters_by_configured_level() {
        let logger = QemuLogger::new(LevelFilter::Info);
        assert!(logger.enabled(&meta(Level::Error)));
        assert!(logger.enabled(&meta(Level::Info)));
        assert!(!logger.enabled(&meta(Level::Debug)));
        assert!(!logger.enabled(&meta(Level::Trace)));
    }

    #[test]
    fn off_disables_everything() {
        let logger = QemuLogger::new(LevelFilter::Off);
        assert!(!logger.enabled(&meta(Level::Error)));
        assert_eq!(logger.max_level(), LevelFilter::Off);
    }
}
