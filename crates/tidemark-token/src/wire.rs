// SPDX-License-Identifier: Apache-2.0
//! Fixed-width integer and base64 text helpers for the token wire layer.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use thiserror::Error;

use crate::token::Alphabet;

/// Error returned by checked wire reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireError {
    /// The input slice was shorter than the fixed-width value requires.
    #[error("short input: need {need} bytes, have {have}")]
    ShortInput {
        /// Bytes required by the value being read.
        need: usize,
        /// Bytes actually available.
        have: usize,
    },
}

/// Appends `value` to `out` as 8 big-endian bytes.
pub fn put_u64_be(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Reads a big-endian u64 from the first 8 bytes of `input`.
///
/// # Errors
/// Returns [`WireError::ShortInput`] when fewer than 8 bytes are available.
pub fn read_u64_be(input: &[u8]) -> Result<u64, WireError> {
    let Some(head) = input.get(..8) else {
        return Err(WireError::ShortInput {
            need: 8,
            have: input.len(),
        });
    };
    let mut buf = [0u8; 8];
    buf.copy_from_slice(head);
    Ok(u64::from_be_bytes(buf))
}

/// Interprets the first 8 bytes of a 32-byte digest as a big-endian u64.
///
/// Fixed-size companion to [`read_u64_be`] for hash-prefix identifiers,
/// where the input length is known at compile time.
#[must_use]
pub fn u64_be_prefix(digest: &[u8; 32]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(buf)
}

/// Encodes `bytes` as token text under the given alphabet.
pub(crate) fn encode_token_text(alphabet: Alphabet, bytes: &[u8]) -> String {
    match alphabet {
        Alphabet::UrlSafeNoPad => URL_SAFE_NO_PAD.encode(bytes),
        Alphabet::Standard => STANDARD.encode(bytes),
    }
}

/// Decodes token text under the given alphabet. Returns `None` on any
/// malformed input; callers fold this into their opaque decode error.
pub(crate) fn decode_token_text(alphabet: Alphabet, text: &str) -> Option<Vec<u8>> {
    match alphabet {
        Alphabet::UrlSafeNoPad => URL_SAFE_NO_PAD.decode(text).ok(),
        Alphabet::Standard => STANDARD.decode(text).ok(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn u64_round_trips_big_endian() {
        let mut out = Vec::new();
        put_u64_be(&mut out, 0x0102_0304_0506_0708);
        assert_eq!(out, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(read_u64_be(&out).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn read_rejects_short_input() {
        assert_eq!(
            read_u64_be(&[1, 2, 3]),
            Err(WireError::ShortInput { need: 8, have: 3 })
        );
    }

    #[test]
    fn prefix_matches_checked_read() {
        let mut digest = [0u8; 32];
        digest[..8].copy_from_slice(&[9, 8, 7, 6, 5, 4, 3, 2]);
        assert_eq!(u64_be_prefix(&digest), read_u64_be(&digest).unwrap());
    }

    #[test]
    fn alphabets_differ_on_the_wire() {
        // 0xfb 0xef forces characters outside the url-safe alphabet.
        let bytes = [0xfb, 0xef, 0xff];
        let std_text = encode_token_text(Alphabet::Standard, &bytes);
        let url_text = encode_token_text(Alphabet::UrlSafeNoPad, &bytes);
        assert_ne!(std_text, url_text);
        assert_eq!(
            decode_token_text(Alphabet::Standard, &std_text).unwrap(),
            bytes
        );
        assert_eq!(
            decode_token_text(Alphabet::UrlSafeNoPad, &url_text).unwrap(),
            bytes
        );
    }

    #[test]
    fn standard_decode_rejects_url_safe_text() {
        let bytes = [0xfb, 0xef, 0xff];
        let url_text = encode_token_text(Alphabet::UrlSafeNoPad, &bytes);
        assert!(decode_token_text(Alphabet::Standard, &url_text).is_none());
    }
}
