//! Fixed values shared by the token codec and the tag write session.

/// Scheme URL every contact token starts with. The encoded contact follows the fragment marker.
pub const CONTACT_URL_PREFIX: &str = "https://meshtastic.org/v/#";

/// Delay before polling again after more than one tag was presented.
pub const DEFAULT_REPOLL_DELAY_MS: u64 = 500;

/// Prompt shown by the platform sheet while waiting for a tag.
pub const DEFAULT_PROMPT_MESSAGE: &str = "Hold your device near the NFC tag.";

pub(crate) const TOO_MANY_TAGS_MESSAGE: &str =
    "More than one tag detected. Please present only one.";
pub(crate) const CONNECT_FAILED_MESSAGE: &str = "Failed to connect to tag.";
pub(crate) const CAPABILITY_QUERY_FAILED_MESSAGE: &str = "Failed to read tag.";
pub(crate) const UNSUPPORTED_TAG_MESSAGE: &str = "Tag does not support NDEF.";
pub(crate) const READ_ONLY_TAG_MESSAGE: &str = "Tag is read-only.";
pub(crate) const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload.";
pub(crate) const WRITE_FAILED_MESSAGE: &str = "Failed to write tag.";
pub(crate) const WRITE_SUCCEEDED_MESSAGE: &str = "NFC tag written successfully.";
pub(crate) const CANCELLED_MESSAGE: &str = "Scan cancelled.";
pub(crate) const SESSION_ENDED_MESSAGE: &str = "NFC session ended.";
