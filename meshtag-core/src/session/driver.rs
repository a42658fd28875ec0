//! Platform interface for NFC reader sessions.
//!
//! The host app adapts its native reader session (e.g. `NFCNDEFReaderSession` on iOS)
//! to [`NfcTagDriver`]. Delegate callbacks become [`SessionEvent`]s returned from
//! [`NfcTagDriver::next_event`]; completion-handler operations become async methods.

use strum::IntoStaticStr;

use crate::error::NfcDriverError;

/// A tag handed out by the platform. `handle` is opaque to Meshtag and only echoed back.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NfcTag {
    /// Platform-side identifier of the detected tag.
    pub handle: u64,
}

/// NDEF status reported by a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, uniffi::Enum)]
#[strum(serialize_all = "snake_case")]
pub enum TagCapability {
    /// The tag is not NDEF formatted.
    NotSupported,
    /// The tag holds NDEF data but is locked.
    ReadOnly,
    /// The tag accepts NDEF writes.
    ReadWrite,
}

/// Notifications the platform delivers while a reader session is open.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum SessionEvent {
    /// The session started polling.
    Active,
    /// One or more tags entered the field.
    TagsDetected {
        /// Tags currently in range.
        tags: Vec<NfcTag>,
    },
    /// The platform closed the session (user dismissed the sheet, timeout, system error).
    Invalidated {
        /// Platform description of why.
        reason: String,
    },
}

/// Options for opening a reader session.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SessionOptions {
    /// Must stay `false` so polling can restart after several tags were presented.
    pub invalidate_after_first_read: bool,
    /// Prompt shown by the system sheet.
    pub alert_message: String,
}

/// Reader session driven by the host platform.
///
/// One driver serves one reader session at a time. Events for a session must be
/// delivered in causal order: `Active` before detections, and every operation's
/// result before the next operation is issued. Anything still queued from an earlier
/// session ahead of the new session's `Active` is discarded, so a session that cannot
/// start must fail [`NfcTagDriver::begin_session`] rather than report `Invalidated`.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait NfcTagDriver: Send + Sync {
    /// Opens a reader session and starts polling.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot read NFC tags.
    async fn begin_session(&self, options: SessionOptions) -> Result<(), NfcDriverError>;

    /// Waits for the next session notification.
    async fn next_event(&self) -> SessionEvent;

    /// Updates the prompt shown by the system sheet.
    fn set_alert_message(&self, message: String);

    /// Resumes polling after a detection was rejected.
    fn restart_polling(&self);

    /// Connects to `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    async fn connect(&self, tag: NfcTag) -> Result<(), NfcDriverError>;

    /// Reads the NDEF status of a connected tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be read.
    async fn query_capability(&self, tag: NfcTag) -> Result<TagCapability, NfcDriverError>;

    /// Writes a raw NDEF message to a connected tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn write_message(&self, tag: NfcTag, message: Vec<u8>) -> Result<(), NfcDriverError>;

    /// Closes the reader session, leaving `alert_message` on the sheet.
    fn invalidate(&self, alert_message: String);
}
