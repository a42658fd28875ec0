use std::sync::{Arc, OnceLock};

/// Sink for log lines produced by Meshtag.
///
/// Implemented by the host app (via `UniFFI`) to route library logs into its own
/// logging system, e.g. `OSLog` on iOS or `Logcat` on Android. The same trait is
/// used for the process-wide bridge installed with [`set_logger`] and for the
/// per-session logger handed to [`crate::TagWriteSession::new`].
///
/// # Examples
///
/// ```rust
/// use meshtag_core::logger::{LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## Swift
///
/// ```swift
/// final class MeshtagLogger: Meshtag.Logger {
///     private let logger = os.Logger(subsystem: "org.meshtastic.app", category: "NFC")
///
///     func log(level: Meshtag.LogLevel, message: String) {
///         logger.log(level: level.osLogType, "\(message)")
///     }
/// }
///
/// Meshtag.setLogger(logger: MeshtagLogger()) // once, at launch
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Records `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Diagnostics useful while developing.
    Debug,
    /// Normal progress, e.g. a tag was written.
    Info,
    /// Recoverable oddities.
    Warn,
    /// Failures surfaced to the user.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// `log::Log` implementation forwarding records to the host's [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records are only forwarded when they come from Meshtag itself,
/// so chatty dependencies do not flood the host's log.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let is_from_meshtag =
        module_path.is_some_and(|module_path| module_path.starts_with("meshtag"));
    let is_debug_or_trace = level == log::Level::Debug || level == log::Level::Trace;

    !is_debug_or_trace || is_from_meshtag
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs the process-wide logger that receives every `log` record emitted by
/// Meshtag.
///
/// Only the first call has an effect; later calls print a notice and keep the
/// logger that is already installed.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        println!("Logger already set");
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
