use strum::IntoStaticStr;
use thiserror::Error;

/// Why a tag write transaction ended without writing the tag.
///
/// Every reason is terminal; the user has to start a new scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, IntoStaticStr, uniffi::Enum)]
#[strum(serialize_all = "snake_case")]
pub enum SessionError {
    /// Connecting to the detected tag failed.
    #[error("connect_failed")]
    ConnectFailed,
    /// The tag's NDEF status could not be read.
    #[error("capability_query_failed")]
    CapabilityQueryFailed,
    /// The tag is not NDEF formatted.
    #[error("unsupported_tag")]
    UnsupportedTag,
    /// The tag is locked.
    #[error("read_only_tag")]
    ReadOnlyTag,
    /// The token cannot be stored as a URI record.
    #[error("invalid_payload")]
    InvalidPayload,
    /// The platform reported a failed write.
    #[error("write_failed")]
    WriteFailed,
    /// The platform ended the session on its own, e.g. user dismissal or timeout.
    #[error("session_invalidated")]
    SessionInvalidated,
    /// The caller cancelled the scan.
    #[error("cancelled")]
    Cancelled,
}

/// Terminal result of a tag write transaction.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum WriteOutcome {
    /// The token is on the tag.
    Success {
        /// Status message shown to the user.
        message: String,
    },
    /// The transaction ended early.
    Failure {
        /// Machine-readable reason.
        reason: SessionError,
        /// Status message shown to the user.
        message: String,
    },
}

impl WriteOutcome {
    /// Whether the tag was written.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure reason, if any.
    #[must_use]
    pub const fn failure_reason(&self) -> Option<SessionError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(*reason),
        }
    }

    /// The user-facing status message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } | Self::Failure { message, .. } => message,
        }
    }
}

/// Progress of a tag write transaction.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr, uniffi::Enum)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// No transaction has started.
    Idle,
    /// The reader session is opening or polling for tags.
    Scanning,
    /// Exactly one tag was found.
    TagsDetected,
    /// Connecting to the tag.
    Connecting,
    /// Reading the tag's NDEF status.
    QueryingCapability,
    /// Writing the NDEF message.
    Writing,
    /// The transaction is over.
    Done {
        /// How it ended.
        outcome: WriteOutcome,
    },
}

impl SessionState {
    /// Whether the transaction has finished.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// Whether the transaction can move from `self` to `next`.
    ///
    /// `Scanning -> Scanning` covers re-polling. Any running state may end in
    /// `Done`; `Done` itself has no way out.
    #[must_use]
    pub const fn can_advance_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Scanning)
            | (Self::Scanning, Self::Scanning | Self::TagsDetected)
            | (Self::TagsDetected, Self::Connecting)
            | (Self::Connecting, Self::QueryingCapability)
            | (Self::QueryingCapability, Self::Writing) => true,
            (Self::Idle | Self::Done { .. }, _) => false,
            (_, next) => next.is_done(),
        }
    }

    /// Short name used in log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }
}
