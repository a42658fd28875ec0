//! NFC tag write session.
//!
//! A [`TagWriteSession`] writes one contact token onto one tag per [`TagWriteSession::scan`]
//! call, driving the platform reader session through [`NfcTagDriver`]:
//!
//! ```text
//! Idle -> Scanning -> TagsDetected -> Connecting -> QueryingCapability -> Writing -> Done
//!            ^  |
//!            +--+  more than one tag: prompt, wait, poll again
//! ```
//!
//! Any running state may end in `Done`. The reader session is invalidated exactly
//! once per transaction, unless the platform already ended it.

use std::{
    fmt::Display,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::Notify;

use crate::{
    defaults::{
        CANCELLED_MESSAGE, CAPABILITY_QUERY_FAILED_MESSAGE, CONNECT_FAILED_MESSAGE,
        INVALID_PAYLOAD_MESSAGE, READ_ONLY_TAG_MESSAGE, SESSION_ENDED_MESSAGE,
        TOO_MANY_TAGS_MESSAGE, UNSUPPORTED_TAG_MESSAGE, WRITE_FAILED_MESSAGE,
        WRITE_SUCCEEDED_MESSAGE,
    },
    error::ScanError,
    logger::Logger,
    ndef,
};

mod config;
mod context;
mod driver;
mod state;

pub use config::{default_session_config, SessionConfig};
pub use driver::{NfcTag, NfcTagDriver, SessionEvent, SessionOptions, TagCapability};
pub use state::{SessionError, SessionState, WriteOutcome};

use self::context::SessionLog;

/// Writes contact tokens onto NFC tags, one transaction at a time.
#[derive(uniffi::Object)]
pub struct TagWriteSession {
    driver: Arc<dyn NfcTagDriver>,
    config: SessionConfig,
    logger: Option<Arc<dyn Logger>>,
    inner: Mutex<Inner>,
}

struct Inner {
    state: SessionState,
    /// Cancellation signal of the transaction in flight, if any.
    active: Option<Arc<Notify>>,
}

#[uniffi::export]
impl TagWriteSession {
    /// Creates a session on top of the platform `driver`.
    ///
    /// Log lines of every transaction go to `logger`, or to the global logger
    /// installed with [`crate::logger::set_logger`] when `None`.
    #[uniffi::constructor]
    #[must_use]
    pub fn new(
        driver: Arc<dyn NfcTagDriver>,
        config: SessionConfig,
        logger: Option<Arc<dyn Logger>>,
    ) -> Self {
        Self {
            driver,
            config,
            logger,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                active: None,
            }),
        }
    }

    /// State of the current or most recent transaction.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock_inner().state.clone()
    }

    /// Asks the transaction in flight to stop. The reader session is invalidated
    /// and the transaction ends with [`SessionError::Cancelled`].
    ///
    /// Returns `false` if nothing was in flight.
    pub fn cancel(&self) -> bool {
        match &self.lock_inner().active {
            Some(cancel) => {
                cancel.notify_one();
                true
            }
            None => false,
        }
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl TagWriteSession {
    /// Writes `token` onto the next single tag presented to the device.
    ///
    /// Resolves once the transaction is over. Tag-side failures are reported in the
    /// returned [`WriteOutcome`], not as errors.
    ///
    /// # Errors
    ///
    /// - [`ScanError::EmptyToken`] if `token` is empty. No reader session is opened.
    /// - [`ScanError::ScanInFlight`] if another scan on this session has not finished.
    /// - [`ScanError::Unavailable`] if the platform could not open a reader session.
    pub async fn scan(&self, token: String) -> Result<WriteOutcome, ScanError> {
        let log = SessionLog::new(self.logger.clone());
        if token.is_empty() {
            log.warn("rejected scan: empty token");
            return Err(ScanError::EmptyToken);
        }

        let cancel = {
            let mut inner = self.lock_inner();
            if inner.active.is_some() {
                drop(inner);
                log.warn("rejected scan: another transaction is in flight");
                return Err(ScanError::ScanInFlight);
            }
            let cancel = Arc::new(Notify::new());
            inner.active = Some(Arc::clone(&cancel));
            inner.state = SessionState::Idle;
            cancel
        };

        let mut transaction = Transaction {
            session: self,
            log,
            cancel,
            token,
            // the platform may show its sheet before begin resolves
            opened: true,
            finished: false,
        };
        transaction.advance(SessionState::Scanning);

        let options = SessionOptions {
            invalidate_after_first_read: false,
            alert_message: self.config.prompt_message.clone(),
        };
        let begun = transaction.guarded(self.driver.begin_session(options)).await;
        let result = match begun {
            Ok(Ok(())) => transaction.drive().await,
            Ok(Err(error)) => {
                transaction.opened = false;
                self.lock_inner().state = SessionState::Idle;
                transaction
                    .log
                    .error(format_args!("could not begin reader session error={error}"));
                return Err(ScanError::Unavailable(error.to_string()));
            }
            Err(interrupt) => Err(interrupt.into()),
        };
        Ok(transaction.finish(result))
    }
}

impl TagWriteSession {
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How a transaction stopped before writing.
enum Interrupt {
    Cancelled,
    Invalidated(String),
}

enum Ending {
    Failed {
        reason: SessionError,
        message: &'static str,
        detail: String,
    },
    Interrupted(Interrupt),
}

impl Ending {
    fn failed(reason: SessionError, message: &'static str, detail: impl Display) -> Self {
        Self::Failed {
            reason,
            message,
            detail: detail.to_string(),
        }
    }
}

impl From<Interrupt> for Ending {
    fn from(interrupt: Interrupt) -> Self {
        Self::Interrupted(interrupt)
    }
}

/// One write transaction. Dropping it before [`Transaction::finish`] (e.g. when the
/// `scan` future is abandoned) still invalidates the reader session.
struct Transaction<'a> {
    session: &'a TagWriteSession,
    log: SessionLog,
    cancel: Arc<Notify>,
    token: String,
    opened: bool,
    finished: bool,
}

impl Transaction<'_> {
    async fn drive(&self) -> Result<(), Ending> {
        let driver = &self.session.driver;

        let tag = self.wait_for_single_tag().await?;
        self.advance(SessionState::TagsDetected);

        self.advance(SessionState::Connecting);
        self.guarded(driver.connect(tag.clone()))
            .await?
            .map_err(|e| Ending::failed(SessionError::ConnectFailed, CONNECT_FAILED_MESSAGE, e))?;

        self.advance(SessionState::QueryingCapability);
        let capability = self
            .guarded(driver.query_capability(tag.clone()))
            .await?
            .map_err(|e| {
                Ending::failed(
                    SessionError::CapabilityQueryFailed,
                    CAPABILITY_QUERY_FAILED_MESSAGE,
                    e,
                )
            })?;
        self.log
            .debug(format_args!("tag capability={}", <&str>::from(capability)));

        match capability {
            TagCapability::NotSupported => {
                return Err(Ending::failed(
                    SessionError::UnsupportedTag,
                    UNSUPPORTED_TAG_MESSAGE,
                    "tag does not support NDEF",
                ));
            }
            TagCapability::ReadOnly => {
                return Err(Ending::failed(
                    SessionError::ReadOnlyTag,
                    READ_ONLY_TAG_MESSAGE,
                    "tag is read-only",
                ));
            }
            TagCapability::ReadWrite => {}
        }

        let message = ndef::build_uri_message(&self.token).map_err(|e| {
            Ending::failed(SessionError::InvalidPayload, INVALID_PAYLOAD_MESSAGE, e)
        })?;

        self.advance(SessionState::Writing);
        self.guarded(driver.write_message(tag, message))
            .await?
            .map_err(|e| Ending::failed(SessionError::WriteFailed, WRITE_FAILED_MESSAGE, e))
    }

    /// Waits until exactly one tag is in range. Events queued before `Active` belong
    /// to an earlier reader session and are dropped.
    async fn wait_for_single_tag(&self) -> Result<NfcTag, Interrupt> {
        let mut active = false;
        loop {
            match self.guarded(self.session.driver.next_event()).await? {
                SessionEvent::Active => {
                    active = true;
                    self.log.debug("reader session became active");
                }
                stale if !active => self
                    .log
                    .debug(format_args!("discarding {stale:?} from an earlier reader session")),
                SessionEvent::Invalidated { reason } => {
                    return Err(Interrupt::Invalidated(reason));
                }
                SessionEvent::TagsDetected { tags } => match tags.as_slice() {
                    [tag] => return Ok(tag.clone()),
                    [] => self.log.debug("detection reported no tags"),
                    _ => {
                        self.log.warn(format_args!(
                            "{} tags detected, polling again",
                            tags.len()
                        ));
                        self.session
                            .driver
                            .set_alert_message(TOO_MANY_TAGS_MESSAGE.to_string());
                        self.advance(SessionState::Scanning);
                        self.repoll().await?;
                    }
                },
            }
        }
    }

    /// Waits out the re-poll delay, then restarts polling. Cancellation or platform
    /// invalidation during the wait wins over the re-poll.
    async fn repoll(&self) -> Result<(), Interrupt> {
        let delay = tokio::time::sleep(self.session.config.repoll_delay());
        tokio::pin!(delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.notified() => return Err(Interrupt::Cancelled),
                () = &mut delay => break,
                event = self.session.driver.next_event() => match event {
                    SessionEvent::Invalidated { reason } => {
                        return Err(Interrupt::Invalidated(reason));
                    }
                    other => self
                        .log
                        .debug(format_args!("ignoring {other:?} before polling again")),
                },
            }
        }

        self.session.driver.restart_polling();
        Ok(())
    }

    /// Runs `operation` unless the transaction is cancelled first.
    async fn guarded<T>(&self, operation: impl Future<Output = T>) -> Result<T, Interrupt> {
        tokio::select! {
            biased;
            () = self.cancel.notified() => Err(Interrupt::Cancelled),
            value = operation => Ok(value),
        }
    }

    fn advance(&self, next: SessionState) {
        let mut inner = self.session.lock_inner();
        let from = inner.state.name();
        let to = next.name();
        if inner.state.can_advance_to(&next) {
            inner.state = next;
            drop(inner);
            self.log.debug(format_args!("state {from} -> {to}"));
        } else {
            drop(inner);
            self.log
                .error(format_args!("ignored illegal transition {from} -> {to}"));
        }
    }

    fn finish(&mut self, result: Result<(), Ending>) -> WriteOutcome {
        let state = self.session.state();
        let (outcome, invalidate) = match result {
            Ok(()) => {
                self.log.info("tag written");
                (
                    WriteOutcome::Success {
                        message: WRITE_SUCCEEDED_MESSAGE.to_string(),
                    },
                    true,
                )
            }
            Err(Ending::Failed {
                reason,
                message,
                detail,
            }) => {
                self.log.error(format_args!(
                    "write failed reason={} state={} error={detail}",
                    <&str>::from(reason),
                    state.name()
                ));
                (
                    WriteOutcome::Failure {
                        reason,
                        message: message.to_string(),
                    },
                    true,
                )
            }
            Err(Ending::Interrupted(Interrupt::Cancelled)) => {
                self.log
                    .info(format_args!("scan cancelled state={}", state.name()));
                (cancelled_outcome(), true)
            }
            Err(Ending::Interrupted(Interrupt::Invalidated(reason))) => {
                self.log.error(format_args!(
                    "reader session invalidated state={} error={reason}",
                    state.name()
                ));
                (
                    WriteOutcome::Failure {
                        reason: SessionError::SessionInvalidated,
                        message: SESSION_ENDED_MESSAGE.to_string(),
                    },
                    false,
                )
            }
        };

        self.finished = true;
        if invalidate {
            self.session
                .driver
                .invalidate(outcome.message().to_string());
        }
        self.advance(SessionState::Done {
            outcome: outcome.clone(),
        });
        outcome
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.opened && !self.finished {
            self.log
                .warn("transaction abandoned before completion, invalidating reader session");
            self.session.driver.invalidate(CANCELLED_MESSAGE.to_string());
            self.advance(SessionState::Done {
                outcome: cancelled_outcome(),
            });
        }
        self.session.lock_inner().active = None;
    }
}

fn cancelled_outcome() -> WriteOutcome {
    WriteOutcome::Failure {
        reason: SessionError::Cancelled,
        message: CANCELLED_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, time::Duration};

    use tokio::sync::mpsc;

    use super::*;
    use crate::error::NfcDriverError;

    /// Driver that replays canned detections and answers every operation with a fixed result.
    struct CannedDriver {
        events_tx: mpsc::UnboundedSender<SessionEvent>,
        events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<SessionEvent>>,
        detections: Mutex<VecDeque<Vec<NfcTag>>>,
        capability: TagCapability,
        invalidations: Mutex<Vec<String>>,
        repolls: Mutex<usize>,
    }

    impl CannedDriver {
        fn new(detections: Vec<Vec<NfcTag>>, capability: TagCapability) -> Arc<Self> {
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            Arc::new(Self {
                events_tx,
                events_rx: tokio::sync::Mutex::new(events_rx),
                detections: Mutex::new(detections.into()),
                capability,
                invalidations: Mutex::new(Vec::new()),
                repolls: Mutex::new(0),
            })
        }

        fn detect_next(&self) {
            if let Some(tags) = self.detections.lock().unwrap().pop_front() {
                self.events_tx
                    .send(SessionEvent::TagsDetected { tags })
                    .unwrap();
            }
        }
    }

    #[async_trait::async_trait]
    impl NfcTagDriver for CannedDriver {
        async fn begin_session(&self, options: SessionOptions) -> Result<(), NfcDriverError> {
            assert!(!options.invalidate_after_first_read);
            self.events_tx.send(SessionEvent::Active).unwrap();
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
                    reason: "closed".to_string(),
                })
        }

        fn set_alert_message(&self, _message: String) {}

        fn restart_polling(&self) {
            *self.repolls.lock().unwrap() += 1;
            self.detect_next();
        }

        async fn connect(&self, _tag: NfcTag) -> Result<(), NfcDriverError> {
            Ok(())
        }

        async fn query_capability(&self, _tag: NfcTag) -> Result<TagCapability, NfcDriverError> {
            Ok(self.capability)
        }

        async fn write_message(
            &self,
            _tag: NfcTag,
            _message: Vec<u8>,
        ) -> Result<(), NfcDriverError> {
            Ok(())
        }

        fn invalidate(&self, alert_message: String) {
            self.invalidations.lock().unwrap().push(alert_message);
        }
    }

    const TOKEN: &str = "https://meshtastic.org/v/#CAE";

    fn tag(handle: u64) -> NfcTag {
        NfcTag { handle }
    }

    #[tokio::test]
    async fn test_happy_path() {
        let driver = CannedDriver::new(vec![vec![tag(1)]], TagCapability::ReadWrite);
        let session = TagWriteSession::new(driver.clone(), SessionConfig::default(), None);

        let outcome = session.scan(TOKEN.to_string()).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(session.state(), SessionState::Done { outcome });
        assert_eq!(
            *driver.invalidations.lock().unwrap(),
            vec![WRITE_SUCCEEDED_MESSAGE.to_string()]
        );
        assert!(!session.cancel());
    }

    #[tokio::test]
    async fn test_read_only_tag() {
        let driver = CannedDriver::new(vec![vec![tag(1)]], TagCapability::ReadOnly);
        let session = TagWriteSession::new(driver.clone(), SessionConfig::default(), None);

        let outcome = session.scan(TOKEN.to_string()).await.unwrap();

        assert_eq!(outcome.failure_reason(), Some(SessionError::ReadOnlyTag));
        assert_eq!(outcome.message(), READ_ONLY_TAG_MESSAGE);
        assert_eq!(driver.invalidations.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_tags_repoll_once() {
        let driver = CannedDriver::new(
            vec![vec![tag(1), tag(2)], vec![tag(2)]],
            TagCapability::ReadWrite,
        );
        let session = TagWriteSession::new(driver.clone(), SessionConfig::default(), None);

        let started = tokio::time::Instant::now();
        let outcome = session.scan(TOKEN.to_string()).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(*driver.repolls.lock().unwrap(), 1);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_empty_token_never_begins() {
        let driver = CannedDriver::new(vec![vec![tag(1)]], TagCapability::ReadWrite);
        let session = TagWriteSession::new(driver.clone(), SessionConfig::default(), None);

        assert_eq!(
            session.scan(String::new()).await.unwrap_err(),
            ScanError::EmptyToken
        );
        assert_eq!(session.state(), SessionState::Idle);
        // begin_session would have queued `Active`
        assert!(driver.events_rx.lock().await.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_token_is_invalid_payload() {
        let driver = CannedDriver::new(vec![vec![tag(1)]], TagCapability::ReadWrite);
        let session = TagWriteSession::new(driver.clone(), SessionConfig::default(), None);

        let outcome = session.scan("not a uri".to_string()).await.unwrap();

        assert_eq!(outcome.failure_reason(), Some(SessionError::InvalidPayload));
        assert_eq!(
            *driver.invalidations.lock().unwrap(),
            vec![INVALID_PAYLOAD_MESSAGE.to_string()]
        );
    }
}
