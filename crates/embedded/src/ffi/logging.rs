//! `log` backend forwarding records to a host callback
//!
//! Records from this crate are forwarded at the configured level. Records from
//! dependencies (HTTP, TLS, SQLite) only get through at `Warn` and above, so a
//! `Debug` host level shows sync decisions without per-request transport noise.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use log::{Level, Log, Metadata, Record, SetLoggerError};

use super::types::{FfiLogLevel, LogCallback};

const CRATE_TARGET: &str = "embedded";

static LOGGER: OnceLock<CallbackLogger> = OnceLock::new();

struct CallbackLogger {
    sink: RwLock<Option<Arc<dyn LogCallback>>>,
    /// `Level as usize`; lower is more severe
    level: AtomicUsize,
}

impl CallbackLogger {
    fn new(level: Level) -> Self {
        Self {
            sink: RwLock::new(None),
            level: AtomicUsize::new(level as usize),
        }
    }

    fn set_sink(&self, sink: Option<Arc<dyn LogCallback>>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = sink;
    }

    fn set_level(&self, level: Level) {
        self.level.store(level as usize, Ordering::Relaxed);
    }

    fn sink(&self) -> Option<Arc<dyn LogCallback>> {
        self.sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn forwards(&self, metadata: &Metadata) -> bool {
        let level = metadata.level();
        if level as usize > self.level.load(Ordering::Relaxed) {
            return false;
        }
        level <= Level::Warn || is_own_target(metadata.target())
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(CRATE_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl Log for CallbackLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.forwards(metadata) && self.sink().is_some()
    }

    fn log(&self, record: &Record) {
        if !self.forwards(record.metadata()) {
            return;
        }
        // Cloned out so the host callback never runs under the lock
        if let Some(sink) = self.sink() {
            sink.on_log(
                FfiLogLevel::from(record.level()),
                record.target().to_string(),
                record.args().to_string(),
            );
        }
    }

    fn flush(&self) {}
}

/// Install the callback logger as the global `log` backend
///
/// Fails if another logger is already installed. Records are dropped until a
/// sink is set.
pub fn install_logger(level: Level) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| CallbackLogger::new(level));
    log::set_logger(logger)?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}

/// Replace the host sink; `None` drops records
pub fn set_log_sink(sink: Option<Arc<dyn LogCallback>>) {
    if let Some(logger) = LOGGER.get() {
        logger.set_sink(sink);
    }
}

pub fn set_log_level(level: Level) {
    if let Some(logger) = LOGGER.get() {
        logger.set_level(level);
        log::set_max_level(level.to_level_filter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<(FfiLogLevel, String, String)>>);

    impl LogCallback for RecordingSink {
        fn on_log(&self, level: FfiLogLevel, target: String, message: String) {
            self.0.lock().unwrap().push((level, target, message));
        }
    }

    fn logger_with_sink(level: Level) -> (CallbackLogger, Arc<RecordingSink>) {
        let logger = CallbackLogger::new(level);
        let sink = Arc::new(RecordingSink::default());
        logger.set_sink(Some(sink.clone()));
        (logger, sink)
    }

    fn metadata(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn test_own_records_follow_level() {
        let (logger, _sink) = logger_with_sink(Level::Debug);
        assert!(logger.enabled(&metadata(Level::Debug, "embedded::sync::manager")));
        assert!(!logger.enabled(&metadata(Level::Trace, "embedded::sync::manager")));

        logger.set_level(Level::Warn);
        assert!(!logger.enabled(&metadata(Level::Info, "embedded")));
        assert!(logger.enabled(&metadata(Level::Warn, "embedded")));
    }

    #[test]
    fn test_dependency_records_need_warn() {
        let (logger, _sink) = logger_with_sink(Level::Trace);
        assert!(!logger.enabled(&metadata(Level::Debug, "ureq::unversioned::transport")));
        assert!(!logger.enabled(&metadata(Level::Info, "embedded_ffi")));
        assert!(logger.enabled(&metadata(Level::Warn, "rusqlite")));
    }

    #[test]
    fn test_no_sink_drops_records() {
        let logger = CallbackLogger::new(Level::Trace);
        assert!(!logger.enabled(&metadata(Level::Error, "embedded")));
    }

    #[test]
    fn test_forwards_record_fields() {
        let (logger, sink) = logger_with_sink(Level::Info);

        logger.log(
            &Record::builder()
                .args(format_args!("Embedded sync complete"))
                .level(Level::Info)
                .target("embedded::sync::manager")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("skipped"))
                .level(Level::Debug)
                .target("embedded::sync::manager")
                .build(),
        );

        let records = sink.0.lock().unwrap();
        assert_eq!(
            *records,
            vec![(
                FfiLogLevel::Info,
                "embedded::sync::manager".to_string(),
                "Embedded sync complete".to_string()
            )]
        );
    }
}
