//! Contact token codec.
//!
//! A token is `https://meshtastic.org/v/#` followed by the URL-safe base64 of a
//! protobuf `SharedContact`. Scanning the URL with any Meshtastic client imports
//! the contact.

use prost::Message;

use crate::{defaults::CONTACT_URL_PREFIX, error::DecodeError};

pub mod base64url;
mod identity;
mod proto;

pub use identity::{
    contact_record_for_active_device, contact_token_for_active_device, ContactIdentity,
    DeviceIdentity, IdentitySource,
};

/// A node contact as shared through a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct ContactRecord {
    /// Node number of the shared device. `0` when no device is known.
    pub device_id: u32,
    /// Serialized node identity (see [`ContactIdentity::to_bytes`]). Empty when unknown.
    pub identity: Vec<u8>,
    /// Whether the sharer vouches for the contact.
    pub verified: bool,
}

impl ContactRecord {
    /// Encodes the record as a contact token. Encoding is deterministic and never fails.
    #[must_use]
    pub fn to_token(&self) -> String {
        let bytes = proto::SharedContact {
            node_num: self.device_id,
            user: self.identity.clone(),
            manually_verified: self.verified,
        }
        .encode_to_vec();

        let token = format!("{CONTACT_URL_PREFIX}{}", base64url::encode(bytes));
        log::trace!("encoded contact for node {} ({} chars)", self.device_id, token.len());
        token
    }

    /// Decodes a contact token.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MalformedPrefix`] if the token does not start with the contact URL.
    /// - [`DecodeError::InvalidBase64`] if the fragment is not URL-safe base64.
    /// - [`DecodeError::InvalidSchema`] if the decoded bytes are not a contact message.
    pub fn from_token(token: &str) -> Result<Self, DecodeError> {
        let fragment = token
            .strip_prefix(CONTACT_URL_PREFIX)
            .ok_or(DecodeError::MalformedPrefix)?;

        let bytes = base64url::decode(fragment)?;

        let contact = proto::SharedContact::decode(bytes.as_slice())
            .map_err(|e| DecodeError::InvalidSchema(e.to_string()))?;

        Ok(Self {
            device_id: contact.node_num,
            identity: contact.user,
            verified: contact.manually_verified,
        })
    }

    /// Whether the record carries a node identity.
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.identity.is_empty()
    }

    /// Parses the embedded identity.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidSchema`] if the identity bytes are not a `User` message.
    pub fn identity_details(&self) -> Result<ContactIdentity, DecodeError> {
        ContactIdentity::from_bytes(&self.identity)
    }
}

/// Encodes `record` as a URL-safe contact token.
#[uniffi::export]
#[must_use]
pub fn encode_contact_token(record: ContactRecord) -> String {
    record.to_token()
}

/// Decodes a contact token produced by [`encode_contact_token`] or any Meshtastic client.
///
/// # Errors
///
/// See [`ContactRecord::from_token`].
#[uniffi::export]
pub fn decode_contact_token(token: &str) -> Result<ContactRecord, DecodeError> {
    ContactRecord::from_token(token)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn sample() -> ContactRecord {
        ContactRecord {
            device_id: 0x0102_0304,
            identity: ContactIdentity {
                id: "!01020304".to_string(),
                long_name: "Ridge Repeater".to_string(),
                short_name: "RDG".to_string(),
                ..ContactIdentity::default()
            }
            .to_bytes(),
            verified: true,
        }
    }

    #[test]
    fn test_known_token() {
        let record = ContactRecord {
            device_id: 0x0102_0304,
            identity: vec![0x0a, 0x01, b'x'],
            verified: true,
        };
        // bytes 08 84 86 88 08 12 03 0a 01 78 20 01
        assert_eq!(
            record.to_token(),
            "https://meshtastic.org/v/#CISGiAgSAwoBeCAB"
        );
    }

    #[test]
    fn test_round_trip() {
        let record = sample();
        assert_eq!(ContactRecord::from_token(&record.to_token()).unwrap(), record);
    }

    #[test]
    fn test_default_record_round_trip() {
        let token = ContactRecord::default().to_token();
        assert_eq!(token, CONTACT_URL_PREFIX);
        assert_eq!(
            ContactRecord::from_token(&token).unwrap(),
            ContactRecord::default()
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        assert_eq!(sample().to_token(), sample().to_token());
    }

    #[test_case("not-a-valid-url"; "plain text")]
    #[test_case(""; "empty")]
    #[test_case("https://meshtastic.org/e/#CgMSAQ"; "channel url")]
    #[test_case("http://meshtastic.org/v/#CAE"; "wrong scheme")]
    fn test_malformed_prefix(token: &str) {
        assert_eq!(
            ContactRecord::from_token(token).unwrap_err(),
            DecodeError::MalformedPrefix
        );
    }

    #[test_case("https://meshtastic.org/v/#@@@@"; "foreign characters")]
    #[test_case("https://meshtastic.org/v/#A"; "impossible length")]
    #[test_case("https://meshtastic.org/v/#CA E"; "embedded space")]
    #[test_case("https://meshtastic.org/v/#+/8"; "standard alphabet")]
    fn test_invalid_base64(token: &str) {
        assert!(matches!(
            ContactRecord::from_token(token).unwrap_err(),
            DecodeError::InvalidBase64(_)
        ));
    }

    #[test]
    fn test_invalid_schema() {
        // a lone field key with no value
        let token = format!("{CONTACT_URL_PREFIX}{}", base64url::encode([0x08]));
        assert!(matches!(
            ContactRecord::from_token(&token).unwrap_err(),
            DecodeError::InvalidSchema(_)
        ));
    }

    #[test]
    fn test_padded_fragment_is_accepted() {
        let record = ContactRecord {
            device_id: 1,
            identity: vec![],
            verified: false,
        };
        // 08 01 -> "CAE="
        assert_eq!(
            ContactRecord::from_token("https://meshtastic.org/v/#CAE=").unwrap(),
            record
        );
        assert_eq!(record.to_token(), "https://meshtastic.org/v/#CAE");
    }
}
