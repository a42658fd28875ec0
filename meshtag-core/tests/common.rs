//! Common test utilities shared across integration tests.
#![allow(dead_code, missing_docs)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use meshtag_core::logger::{LogLevel, Logger};
use meshtag_core::{
    NfcDriverError, NfcTag, NfcTagDriver, SessionEvent, SessionOptions, SessionState,
    TagCapability, TagWriteSession,
};
use tokio::sync::mpsc;

/// Every call the session made into the driver, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Begin { invalidate_after_first_read: bool },
    SetAlert(String),
    RestartPolling,
    Connect(u64),
    QueryCapability(u64),
    Write { handle: u64, message: Vec<u8> },
    Invalidate(String),
}

/// What the scripted platform answers.
pub struct Script {
    /// Detections delivered after `begin_session` and after each `restart_polling`.
    pub detections: Vec<Vec<NfcTag>>,
    pub begin_error: Option<String>,
    /// `begin_session` never resolves, as when the platform sheet hangs while opening.
    pub begin_pending: bool,
    pub connect_error: Option<String>,
    pub capability: Result<TagCapability, String>,
    pub write_error: Option<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            detections: vec![vec![tag(7)]],
            begin_error: None,
            begin_pending: false,
            connect_error: None,
            capability: Ok(TagCapability::ReadWrite),
            write_error: None,
        }
    }
}

pub fn tag(handle: u64) -> NfcTag {
    NfcTag { handle }
}

pub struct ScriptedDriver {
    script: Script,
    detections: Mutex<VecDeque<Vec<NfcTag>>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<SessionEvent>>,
    calls: Mutex<Vec<DriverCall>>,
}

impl ScriptedDriver {
    pub fn new(script: Script) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            detections: Mutex::new(script.detections.clone().into()),
            script,
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Delivers an event as if the platform had called the delegate.
    pub fn push_event(&self, event: SessionEvent) {
        self.events_tx.send(event).expect("receiver alive");
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn invalidations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::Invalidate(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn repolls(&self) -> usize {
        self.count(|call| *call == DriverCall::RestartPolling)
    }

    fn record(&self, call: DriverCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn detect_next(&self) {
        if let Some(tags) = self.detections.lock().unwrap().pop_front() {
            self.push_event(SessionEvent::TagsDetected { tags });
        }
    }
}

#[async_trait::async_trait]
impl NfcTagDriver for ScriptedDriver {
    async fn begin_session(&self, options: SessionOptions) -> Result<(), NfcDriverError> {
        self.record(DriverCall::Begin {
            invalidate_after_first_read: options.invalidate_after_first_read,
        });
        if let Some(error) = &self.script.begin_error {
            return Err(NfcDriverError::platform(error));
        }
        if self.script.begin_pending {
            std::future::pending::<()>().await;
        }
        self.push_event(SessionEvent::Active);
        self.detect_next();
        Ok(())
    }

    async fn next_event(&self) -> SessionEvent {
        let mut events = self.events_rx.lock().await;
        events.recv().await.unwrap_or(SessionEvent::Invalidated {
            reason: "event stream closed".to_string(),
        })
    }

    fn set_alert_message(&self, message: String) {
        self.record(DriverCall::SetAlert(message));
    }

    fn restart_polling(&self) {
        self.record(DriverCall::RestartPolling);
        self.detect_next();
    }

    async fn connect(&self, tag: NfcTag) -> Result<(), NfcDriverError> {
        self.record(DriverCall::Connect(tag.handle));
        self.script
            .connect_error
            .as_ref()
            .map_or(Ok(()), |error| Err(NfcDriverError::platform(error)))
    }

    async fn query_capability(&self, tag: NfcTag) -> Result<TagCapability, NfcDriverError> {
        self.record(DriverCall::QueryCapability(tag.handle));
        self.script
            .capability
            .clone()
            .map_err(NfcDriverError::platform)
    }

    async fn write_message(&self, tag: NfcTag, message: Vec<u8>) -> Result<(), NfcDriverError> {
        self.record(DriverCall::Write {
            handle: tag.handle,
            message,
        });
        self.script
            .write_error
            .as_ref()
            .map_or(Ok(()), |error| Err(NfcDriverError::platform(error)))
    }

    fn invalidate(&self, alert_message: String) {
        self.record(DriverCall::Invalidate(alert_message));
    }
}

/// Logger keeping every line for assertions.
#[derive(Default)]
pub struct CapturingLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl CapturingLogger {
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }
}

impl Logger for CapturingLogger {
    fn log(&self, level: LogLevel, message: String) {
        self.lines.lock().unwrap().push((level, message));
    }
}

/// Yields until the session reaches a state matching `predicate`.
pub async fn wait_for_state(session: &TagWriteSession, predicate: impl Fn(&SessionState) -> bool) {
    for _ in 0..1_000 {
        if predicate(&session.state()) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("session stuck in {:?}", session.state());
}

/// Yields until the driver has seen a call matching `predicate`.
pub async fn wait_for_call(driver: &ScriptedDriver, predicate: impl Fn(&DriverCall) -> bool) {
    for _ in 0..1_000 {
        if driver.count(&predicate) > 0 {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("driver never saw the expected call: {:?}", driver.calls());
}
