// SPDX-License-Identifier: Apache-2.0
//! Deterministic AEAD token codec.
//!
//! Pipeline: CBOR payload → IV derived from `blake3(salt || plaintext)` →
//! authenticated cipher → base64 under the domain alphabet. The inverse
//! collapses every failure mode into one undifferentiated error.
//!
//! Deriving the IV from the plaintext (keyed by the domain salt) instead of
//! randomness makes the codec a pure function: equal payloads yield equal
//! tokens, so clients can cache on token strings and CDNs deduplicate them.
//! The tradeoff is the loss of ciphertext indistinguishability: an observer
//! can tell that two equal entities produced equal tokens. Tidemark accepts
//! that deliberately; tokens name public positions and identities, not
//! secrets.

use std::sync::Arc;

use blake3::Hasher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::cipher::{Cipher, IV_LEN};
use crate::keys::DomainKeys;
use crate::wire::{decode_token_text, encode_token_text};

/// Base64 alphabet a token domain writes its text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// URL-safe, unpadded. Used by the global-id domain so ids can ride in
    /// URLs without escaping.
    UrlSafeNoPad,
    /// Standard alphabet with padding. Used by the cursor domain.
    Standard,
}

/// Error returned by token encode/decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The payload could not be serialized. Encode-side only; indicates a
    /// payload type whose serde representation is not CBOR-expressible.
    #[error("token payload encoding failed")]
    Encode,
    /// The token failed to decode. Deliberately carries no detail: malformed
    /// base64, a failed authentication tag, and a payload schema mismatch are
    /// indistinguishable to callers, so a tampering client learns nothing
    /// about which layer rejected it.
    #[error("invalid token")]
    Decryption,
}

/// One configured token domain: keys, alphabet, cipher.
///
/// Two instances exist per deployment (the id domain and the cursor domain),
/// each with its own key and salt. Nothing ties an instance to a payload
/// type; the same engine serves both domains.
#[derive(Clone)]
pub struct TokenCodec {
    keys: DomainKeys,
    alphabet: Alphabet,
    cipher: Arc<dyn Cipher>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("alphabet", &self.alphabet)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Constructs a codec with an explicit alphabet.
    #[must_use]
    pub fn new(keys: DomainKeys, alphabet: Alphabet, cipher: Arc<dyn Cipher>) -> Self {
        Self {
            keys,
            alphabet,
            cipher,
        }
    }

    /// Codec for the global-id domain (url-safe, unpadded text).
    #[must_use]
    pub fn id_domain(keys: DomainKeys, cipher: Arc<dyn Cipher>) -> Self {
        Self::new(keys, Alphabet::UrlSafeNoPad, cipher)
    }

    /// Codec for the cursor domain (standard base64 text).
    #[must_use]
    pub fn cursor_domain(keys: DomainKeys, cipher: Arc<dyn Cipher>) -> Self {
        Self::new(keys, Alphabet::Standard, cipher)
    }

    /// Encodes `payload` into an opaque token string.
    ///
    /// Deterministic: the same payload under the same domain keys always
    /// produces the same string.
    ///
    /// # Errors
    /// Returns [`TokenError::Encode`] when the payload cannot be serialized,
    /// or [`TokenError::Decryption`] when the cipher rejects the input.
    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<String, TokenError> {
        let mut plaintext = Vec::new();
        ciborium::into_writer(payload, &mut plaintext).map_err(|_| TokenError::Encode)?;
        let iv = self.derive_iv(&plaintext);
        let sealed = self
            .cipher
            .seal(self.keys.key(), &iv, &plaintext)
            .map_err(|_| TokenError::Decryption)?;
        Ok(encode_token_text(self.alphabet, &sealed))
    }

    /// Decodes an opaque token string back into its payload.
    ///
    /// # Errors
    /// Returns [`TokenError::Decryption`] on any failure, without detail.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let sealed = decode_token_text(self.alphabet, token).ok_or(TokenError::Decryption)?;
        let plaintext = self
            .cipher
            .open(self.keys.key(), &sealed)
            .map_err(|_| TokenError::Decryption)?;
        ciborium::from_reader(plaintext.as_slice()).map_err(|_| TokenError::Decryption)
    }

    /// Derives the deterministic IV: first 12 bytes of
    /// `blake3(salt || plaintext)`.
    fn derive_iv(&self, plaintext: &[u8]) -> [u8; IV_LEN] {
        let mut hasher = Hasher::new();
        hasher.update(self.keys.salt());
        hasher.update(plaintext);
        let digest = hasher.finalize();
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&digest.as_bytes()[..IV_LEN]);
        iv
    }
}
