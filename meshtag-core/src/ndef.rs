//! NDEF well-known URI records.
//!
//! A contact tag holds one NDEF message with a single URI record (TNF `0x01`,
//! type `U`). The first payload byte abbreviates a common URI prefix as defined
//! by the NFC Forum URI record type definition.

use thiserror::Error;

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;
const TNF_WELL_KNOWN: u8 = 0x01;
const URI_RECORD_TYPE: &[u8] = b"U";

/// URI identifier codes, indexed by code.
const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Errors building or parsing a URI record.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum NdefError {
    /// There is nothing to write.
    #[error("empty_uri")]
    EmptyUri,
    /// The string is not an absolute URI.
    #[error("invalid_uri: {0}")]
    InvalidUri(String),
    /// The message ends before the record does.
    #[error("truncated_message")]
    Truncated,
    /// The message is not a single well-known URI record.
    #[error("unsupported_record")]
    UnsupportedRecord,
    /// The URI identifier code is outside the known table.
    #[error("unknown_uri_prefix: {0:#04x}")]
    UnknownUriPrefix(u8),
}

/// Builds the payload of a URI record: identifier code followed by the rest of the URI.
///
/// # Errors
///
/// Returns [`NdefError::EmptyUri`] or [`NdefError::InvalidUri`] if `uri` is not an absolute URI.
pub fn uri_record_payload(uri: &str) -> Result<Vec<u8>, NdefError> {
    if uri.is_empty() {
        return Err(NdefError::EmptyUri);
    }
    url::Url::parse(uri).map_err(|e| NdefError::InvalidUri(e.to_string()))?;

    // Longest match wins, e.g. `https://www.` over `https://`.
    let (code, prefix) = URI_PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, prefix)| uri.starts_with(*prefix))
        .max_by_key(|(_, prefix)| prefix.len())
        .unwrap_or((0, &""));

    let rest = &uri.as_bytes()[prefix.len()..];
    let mut payload = Vec::with_capacity(1 + rest.len());
    #[allow(clippy::cast_possible_truncation)] // table has 36 entries
    payload.push(code as u8);
    payload.extend_from_slice(rest);
    Ok(payload)
}

/// Builds a single-record NDEF message holding `uri`.
///
/// # Errors
///
/// See [`uri_record_payload`].
pub fn build_uri_message(uri: &str) -> Result<Vec<u8>, NdefError> {
    let payload = uri_record_payload(uri)?;
    let short = payload.len() <= usize::from(u8::MAX);

    let mut header = FLAG_MB | FLAG_ME | TNF_WELL_KNOWN;
    if short {
        header |= FLAG_SR;
    }

    let mut message = Vec::with_capacity(payload.len() + 7);
    message.push(header);
    #[allow(clippy::cast_possible_truncation)]
    message.push(URI_RECORD_TYPE.len() as u8);
    if short {
        #[allow(clippy::cast_possible_truncation)]
        message.push(payload.len() as u8);
    } else {
        let len = u32::try_from(payload.len()).map_err(|_| {
            NdefError::InvalidUri("uri exceeds the NDEF payload size".to_string())
        })?;
        message.extend_from_slice(&len.to_be_bytes());
    }
    message.extend_from_slice(URI_RECORD_TYPE);
    message.extend_from_slice(&payload);
    Ok(message)
}

/// Reads the URI back out of a message produced by [`build_uri_message`].
///
/// # Errors
///
/// Returns an [`NdefError`] if the message is truncated or is not a single URI record.
pub fn parse_uri_message(message: &[u8]) -> Result<String, NdefError> {
    let (&header, rest) = message.split_first().ok_or(NdefError::Truncated)?;
    let complete = FLAG_MB | FLAG_ME;
    if header & complete != complete
        || header & FLAG_CF != 0
        || header & TNF_MASK != TNF_WELL_KNOWN
    {
        return Err(NdefError::UnsupportedRecord);
    }

    let (&type_len, rest) = rest.split_first().ok_or(NdefError::Truncated)?;
    let (payload_len, rest) = if header & FLAG_SR == 0 {
        let (len, rest) = split_at_checked(rest, 4)?;
        let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]);
        (usize::try_from(len).map_err(|_| NdefError::Truncated)?, rest)
    } else {
        let (&len, rest) = rest.split_first().ok_or(NdefError::Truncated)?;
        (usize::from(len), rest)
    };
    let (id_len, rest) = if header & FLAG_IL == 0 {
        (0, rest)
    } else {
        let (&len, rest) = rest.split_first().ok_or(NdefError::Truncated)?;
        (usize::from(len), rest)
    };

    let (record_type, rest) = split_at_checked(rest, usize::from(type_len))?;
    if record_type != URI_RECORD_TYPE {
        return Err(NdefError::UnsupportedRecord);
    }
    let (_id, rest) = split_at_checked(rest, id_len)?;
    let (payload, rest) = split_at_checked(rest, payload_len)?;
    if !rest.is_empty() {
        return Err(NdefError::UnsupportedRecord);
    }

    let (&code, body) = payload.split_first().ok_or(NdefError::Truncated)?;
    let prefix = URI_PREFIXES
        .get(usize::from(code))
        .ok_or(NdefError::UnknownUriPrefix(code))?;
    let body = std::str::from_utf8(body).map_err(|e| NdefError::InvalidUri(e.to_string()))?;
    Ok(format!("{prefix}{body}"))
}

fn split_at_checked(bytes: &[u8], mid: usize) -> Result<(&[u8], &[u8]), NdefError> {
    bytes.split_at_checked(mid).ok_or(NdefError::Truncated)
}

/// Builds the NDEF message a platform driver should write for `uri`.
///
/// # Errors
///
/// See [`build_uri_message`].
#[uniffi::export]
pub fn ndef_uri_message(uri: &str) -> Result<Vec<u8>, NdefError> {
    build_uri_message(uri)
}
