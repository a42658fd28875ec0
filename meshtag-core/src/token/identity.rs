//! The node identity embedded in a contact and the platform source it comes from.

use std::sync::Arc;

use prost::Message;

use super::{proto, ContactRecord};
use crate::error::{DecodeError, EncodeError};

/// Public identity of a Meshtastic node, i.e. the `User` message shared in a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct ContactIdentity {
    /// Node id in `!xxxxxxxx` form.
    pub id: String,
    /// Human readable node name.
    pub long_name: String,
    /// Up to four characters shown on small screens.
    pub short_name: String,
    /// Hardware model enum value.
    pub hw_model: i32,
    /// Whether the operator is a licensed radio amateur.
    pub is_licensed: bool,
    /// Device role enum value.
    pub role: i32,
    /// Curve25519 public key used for direct messages.
    pub public_key: Vec<u8>,
    /// Whether the node can receive direct messages, when known.
    pub is_unmessagable: Option<bool>,
}

impl ContactIdentity {
    /// Serializes the identity into the opaque bytes stored in [`ContactRecord::identity`].
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        proto::User::from(self.clone()).encode_to_vec()
    }

    /// Parses identity bytes produced by [`ContactIdentity::to_bytes`] or another client.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidSchema`] if the bytes are not a `User` message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        proto::User::decode(bytes)
            .map(Self::from)
            .map_err(|e| DecodeError::InvalidSchema(format!("identity: {e}")))
    }
}

impl From<proto::User> for ContactIdentity {
    fn from(user: proto::User) -> Self {
        Self {
            id: user.id,
            long_name: user.long_name,
            short_name: user.short_name,
            hw_model: user.hw_model,
            is_licensed: user.is_licensed,
            role: user.role,
            public_key: user.public_key,
            is_unmessagable: user.is_unmessagable,
        }
    }
}

impl From<ContactIdentity> for proto::User {
    fn from(identity: ContactIdentity) -> Self {
        Self {
            id: identity.id,
            long_name: identity.long_name,
            short_name: identity.short_name,
            hw_model: identity.hw_model,
            is_licensed: identity.is_licensed,
            role: identity.role,
            public_key: identity.public_key,
            is_unmessagable: identity.is_unmessagable,
        }
    }
}

/// The device the app is currently connected to, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct DeviceIdentity {
    /// Node number. Platforms store it as a 64-bit integer; only 32 bits go on the wire.
    pub node_num: u64,
    /// Identity of the node.
    pub user: ContactIdentity,
}

/// Supplies the identity of the active device.
#[uniffi::export(with_foreign)]
pub trait IdentitySource: Send + Sync {
    /// Returns the connected device, or `None` when no device is connected.
    fn active_device(&self) -> Option<DeviceIdentity>;
}

/// Builds the contact record shared for the active device.
///
/// Shared contacts are always marked as manually verified. When no device is
/// connected the record falls back to node `0` with an empty identity, which
/// still encodes to a valid token.
///
/// # Errors
///
/// Returns [`EncodeError::DeviceIdOutOfRange`] if the node number does not fit in 32 bits.
#[uniffi::export]
pub fn contact_record_for_active_device(
    source: Arc<dyn IdentitySource>,
) -> Result<ContactRecord, EncodeError> {
    let Some(device) = source.active_device() else {
        log::debug!("no active device, sharing an empty contact");
        return Ok(ContactRecord {
            verified: true,
            ..ContactRecord::default()
        });
    };

    let device_id = u32::try_from(device.node_num).map_err(|_| {
        EncodeError::DeviceIdOutOfRange {
            device_id: device.node_num,
        }
    })?;

    Ok(ContactRecord {
        device_id,
        identity: device.user.to_bytes(),
        verified: true,
    })
}

/// Encodes the contact token for the active device.
///
/// # Errors
///
/// See [`contact_record_for_active_device`].
#[uniffi::export]
pub fn contact_token_for_active_device(
    source: Arc<dyn IdentitySource>,
) -> Result<String, EncodeError> {
    contact_record_for_active_device(source).map(|record| record.to_token())
}
