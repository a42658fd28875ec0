//! In-process reader session used by `meshtag simulate`.

use std::collections::VecDeque;
use std::sync::Mutex;

use meshtag_core::logger::{LogLevel, Logger};
use meshtag_core::{
    NfcDriverError, NfcTag, NfcTagDriver, SessionEvent, SessionOptions, TagCapability,
};
use tokio::sync::mpsc;

/// How the simulated platform behaves.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Tags presented at once on the first detection. When more than one, a single
    /// tag follows after polling restarts.
    pub tags: u64,
    pub capability: TagCapability,
    pub fail_connect: bool,
    pub fail_query: bool,
    pub fail_write: bool,
}

/// Reader session that follows a [`Scenario`] and records what it was asked to do.
pub struct SimulatedDriver {
    scenario: Scenario,
    detections: Mutex<VecDeque<Vec<NfcTag>>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<SessionEvent>>,
    journal: Mutex<Vec<String>>,
}

impl SimulatedDriver {
    #[must_use]
    pub fn new(scenario: Scenario) -> Self {
        let detections = match scenario.tags {
            0 => VecDeque::new(),
            1 => VecDeque::from([tags(1)]),
            n => VecDeque::from([tags(n), tags(1)]),
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            scenario,
            detections: Mutex::new(detections),
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far, one line each.
    #[must_use]
    pub fn journal(&self) -> Vec<String> {
        self.journal
            .lock()
            .map(|journal| journal.clone())
            .unwrap_or_default()
    }

    fn note(&self, entry: String) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(entry);
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(error) = self.events_tx.send(event) {
            tracing::warn!("simulated reader dropped {:?}", error.0);
        }
    }

    /// Presents the next scripted detection. With nothing left to present the
    /// platform times the session out, as a real reader sheet would.
    fn detect_next(&self) {
        let next = self
            .detections
            .lock()
            .ok()
            .and_then(|mut detections| detections.pop_front());
        match next {
            Some(tags) => self.emit(SessionEvent::TagsDetected { tags }),
            None => self.emit(SessionEvent::Invalidated {
                reason: "Session timeout".to_string(),
            }),
        }
    }
}

fn outcome(fail: bool, description: &str) -> Result<(), NfcDriverError> {
    if fail {
        Err(NfcDriverError::platform(description))
    } else {
        Ok(())
    }
}

fn tags(count: u64) -> Vec<NfcTag> {
    (1..=count).map(|handle| NfcTag { handle }).collect()
}

#[async_trait::async_trait]
impl NfcTagDriver for SimulatedDriver {
    async fn begin_session(&self, options: SessionOptions) -> Result<(), NfcDriverError> {
        self.note(format!("begin_session prompt={:?}", options.alert_message));
        self.emit(SessionEvent::Active);
        self.detect_next();
        Ok(())
    }

    async fn next_event(&self) -> SessionEvent {
        self.events_rx
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(SessionEvent::Invalidated {
                reason: "driver dropped".to_string(),
            })
    }

    fn set_alert_message(&self, message: String) {
        self.note(format!("set_alert_message {message:?}"));
    }

    fn restart_polling(&self) {
        self.note("restart_polling".to_string());
        self.detect_next();
    }

    async fn connect(&self, tag: NfcTag) -> Result<(), NfcDriverError> {
        self.note(format!("connect tag={}", tag.handle));
        outcome(self.scenario.fail_connect, "Tag connection lost")
    }

    async fn query_capability(&self, tag: NfcTag) -> Result<TagCapability, NfcDriverError> {
        self.note(format!("query_capability tag={}", tag.handle));
        outcome(self.scenario.fail_query, "Tag response error")
            .map(|()| self.scenario.capability)
    }

    async fn write_message(&self, tag: NfcTag, message: Vec<u8>) -> Result<(), NfcDriverError> {
        self.note(format!(
            "write_message tag={} ndef={}",
            tag.handle,
            hex::encode(&message)
        ));
        outcome(self.scenario.fail_write, "Tag is not writable")
    }

    fn invalidate(&self, alert_message: String) {
        self.note(format!("invalidate {alert_message:?}"));
    }
}

/// Forwards session logs into `tracing`.
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: String) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "meshtag::nfc", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "meshtag::nfc", "{message}"),
            LogLevel::Info => tracing::info!(target: "meshtag::nfc", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "meshtag::nfc", "{message}"),
            LogLevel::Error => tracing::error!(target: "meshtag::nfc", "{message}"),
        }
    }
}
