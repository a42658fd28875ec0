use thiserror::Error;

/// Errors raised while turning a contact token back into a [`crate::ContactRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum DecodeError {
    /// The token does not start with the contact URL prefix.
    #[error("malformed_prefix")]
    MalformedPrefix,
    /// The fragment is not valid URL-safe base64.
    #[error("invalid_base64: {0}")]
    InvalidBase64(String),
    /// The decoded bytes are not a valid contact message.
    #[error("invalid_schema: {0}")]
    InvalidSchema(String),
}

/// Errors raised while building a contact record from platform data.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum EncodeError {
    /// The node number reported by the platform does not fit the 32-bit wire field.
    #[error("device_id_out_of_range: {device_id}")]
    DeviceIdOutOfRange {
        /// The rejected node number.
        device_id: u64,
    },
}

/// Rejections returned by [`crate::TagWriteSession::scan`] before any tag is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum ScanError {
    /// Writing an empty token is meaningless, so no session is opened.
    #[error("empty_token")]
    EmptyToken,
    /// Another write transaction is still running on this session.
    #[error("scan_in_flight")]
    ScanInFlight,
    /// The platform refused to open a reader session (e.g. NFC is not available).
    #[error("nfc_unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by the platform NFC driver.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum NfcDriverError {
    /// The platform operation failed; `description` is the platform's own message.
    #[error("platform_error: {description}")]
    Platform {
        /// Localized description provided by the platform.
        description: String,
    },

    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl NfcDriverError {
    /// Convenience constructor for platform failures.
    #[must_use]
    pub fn platform(description: impl Into<String>) -> Self {
        Self::Platform {
            description: description.into(),
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for NfcDriverError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}
