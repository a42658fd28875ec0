//! URL-safe base64 used in contact token fragments.
//!
//! Tokens are written without padding. Decoding also takes padded fragments, which
//! some clients still produce, but rejects the standard alphabet's `+` and `/`.

use base64::{
    alphabet,
    engine::{
        general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
    },
    Engine,
};

use crate::error::DecodeError;

/// URL-safe engine that accepts fragments with or without `=` padding.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes `bytes` as unpadded URL-safe base64.
#[must_use]
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes a URL-safe base64 fragment, padded or not.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidBase64`] if `fragment` is not URL-safe base64.
pub fn decode(fragment: &str) -> Result<Vec<u8>, DecodeError> {
    LENIENT_URL_SAFE
        .decode(fragment)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use rand::{rngs::StdRng, RngCore, SeedableRng};
    use test_case::test_case;

    use super::*;

    #[test_case(b"", ""; "empty")]
    #[test_case(b"f", "Zg"; "two pad characters dropped")]
    #[test_case(b"fo", "Zm8"; "one pad character dropped")]
    #[test_case(b"foo", "Zm9v"; "no padding")]
    #[test_case(&[0xfb, 0xff, 0xbf], "-_-_"; "url safe alphabet")]
    fn test_encode(bytes: &[u8], expected: &str) {
        assert_eq!(encode(bytes), expected);
        assert_eq!(decode(expected).unwrap(), bytes);
    }

    #[test]
    fn test_decode_accepts_padded_fragment() {
        assert_eq!(decode("Zg==").unwrap(), b"f");
        assert_eq!(decode("Zm8=").unwrap(), b"fo");
    }

    #[test_case("+/8"; "standard alphabet")]
    #[test_case("Z"; "impossible length")]
    #[test_case("Zm 8"; "embedded space")]
    fn test_decode_rejects(fragment: &str) {
        assert!(matches!(decode(fragment), Err(DecodeError::InvalidBase64(_))));
    }

    #[test]
    fn test_matches_standard_alphabet_after_substitution() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in 0..96 {
            let mut bytes = vec![0u8; len];
            rng.fill_bytes(&mut bytes);

            let url_safe = encode(&bytes);
            assert!(!url_safe.contains(['+', '/', '=']), "{url_safe}");

            let substituted: String = STANDARD
                .encode(&bytes)
                .trim_end_matches('=')
                .replace('+', "-")
                .replace('/', "_");
            assert_eq!(url_safe, substituted);
            assert_eq!(decode(&url_safe).unwrap(), bytes);
        }
    }
}
