use std::{fmt::Display, sync::Arc};

use uuid::Uuid;

use crate::logger::{LogLevel, Logger};

/// Log context for one write transaction.
///
/// Lines are prefixed with the transaction id and go to the logger injected into
/// the session, or to the `log` facade when none was given.
#[derive(Clone)]
pub(crate) struct SessionLog {
    transaction_id: Uuid,
    sink: Option<Arc<dyn Logger>>,
}

impl SessionLog {
    pub(crate) fn new(sink: Option<Arc<dyn Logger>>) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            sink,
        }
    }

    pub(crate) fn emit(&self, level: LogLevel, message: impl Display) {
        let line = format!("nfc transaction={} {message}", self.transaction_id);
        match &self.sink {
            Some(sink) => sink.log(level, line),
            None => log::log!(log::Level::from(level), "{line}"),
        }
    }

    pub(crate) fn debug(&self, message: impl Display) {
        self.emit(LogLevel::Debug, message);
    }

    pub(crate) fn info(&self, message: impl Display) {
        self.emit(LogLevel::Info, message);
    }

    pub(crate) fn warn(&self, message: impl Display) {
        self.emit(LogLevel::Warn, message);
    }

    pub(crate) fn error(&self, message: impl Display) {
        self.emit(LogLevel::Error, message);
    }
}
