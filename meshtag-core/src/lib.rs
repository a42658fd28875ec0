#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
//! Core of Meshtag: turns a Meshtastic node contact into a URL-safe token and
//! writes it onto an NFC tag through a platform-provided driver.
//!
//! ```rust
//! use meshtag_core::{decode_contact_token, encode_contact_token, ContactRecord};
//!
//! let record = ContactRecord {
//!     device_id: 0xdead_beef,
//!     identity: vec![],
//!     verified: true,
//! };
//! let token = encode_contact_token(record.clone());
//! assert!(token.starts_with("https://meshtastic.org/v/#"));
//! assert_eq!(decode_contact_token(&token).unwrap(), record);
//! ```

pub mod defaults;

mod error;
pub use error::*;

/// Bridge for forwarding library logs to the host application.
pub mod logger;

pub mod ndef;
pub use ndef::ndef_uri_message;

pub mod session;
pub use session::*;

mod token;
pub use token::*;

uniffi::setup_scaffolding!("meshtag_core");
