use crate::lock::SpinLock;
use core::fmt::Write;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// [`Log`] implementation writing one line per record into `W`.
pub struct FirmwareLogger<W> {
    max_level: LevelFilter,
    sink: SpinLock<W>,
}

impl<W: Write + Send> FirmwareLogger<W> {
    #[must_use]
    pub const fn new(max_level: LevelFilter, sink: W) -> Self {
        Self {
            max_level,
            sink: SpinLock::new(sink),
        }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Installs this logger. Call once during early init.
    ///
    /// # Errors
    /// Fails if another logger was installed before.
    pub fn init(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }

    #[must_use]
    pub fn into_sink(self) -> W {
        self.sink.into_inner()
    }
}

impl<W: Write + Send> Log for FirmwareLogger<W> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        #[cfg(feature = "enabled")]
        {
            let mut sink = self.sink.lock();
            // Best-effort; a broken sink has nowhere to report to.
            let _ = writeln!(sink, "[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}
