// SPDX-License-Identifier: Apache-2.0
//! Authenticated-cipher capability boundary.
//!
//! The token codec depends only on this trait; the concrete primitive is
//! supplied by the host at construction. The default [`AesGcmCipher`]
//! (feature `aes`) covers the common case.

use thiserror::Error;

/// Cipher key length in bytes (256-bit keys).
pub const KEY_LEN: usize = 32;

/// Cipher IV length in bytes (96-bit nonces).
pub const IV_LEN: usize = 12;

/// Error returned by cipher operations.
///
/// A single opaque variant: callers must not learn whether the tag, the IV,
/// or the ciphertext structure was at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Sealing or opening failed.
    #[error("authenticated cipher operation failed")]
    Failed,
}

/// Authenticated encryption capability.
///
/// Contract:
/// - `seal` embeds the IV in its output (`iv || ciphertext-with-tag`), so the
///   sealed blob is self-contained.
/// - `open` extracts the IV from the input and must fail with
///   [`CipherError::Failed`] on any authentication failure, without detail.
/// - Both operations are pure with respect to their inputs: sealing the same
///   `(key, iv, plaintext)` must produce identical bytes.
pub trait Cipher: Send + Sync {
    /// Seals `plaintext` under `key` with the caller-supplied `iv`.
    ///
    /// # Errors
    /// Returns [`CipherError::Failed`] when the primitive rejects the input.
    fn seal(
        &self,
        key: &[u8; KEY_LEN],
        iv: &[u8; IV_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CipherError>;

    /// Opens a sealed blob produced by [`Cipher::seal`] under `key`.
    ///
    /// # Errors
    /// Returns [`CipherError::Failed`] on truncated input or tag mismatch.
    fn open(&self, key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// AES-256-GCM implementation of the [`Cipher`] capability.
#[cfg(feature = "aes")]
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

#[cfg(feature = "aes")]
impl Cipher for AesGcmCipher {
    fn seal(
        &self,
        key: &[u8; KEY_LEN],
        iv: &[u8; IV_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        use aes_gcm::aead::Aead;
        use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        let sealed = cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|_| CipherError::Failed)?;
        let mut out = Vec::with_capacity(IV_LEN + sealed.len());
        out.extend_from_slice(iv);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn open(&self, key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        use aes_gcm::aead::Aead;
        use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};

        if sealed.len() < IV_LEN {
            return Err(CipherError::Failed);
        }
        let (iv, body) = sealed.split_at(IV_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        cipher
            .decrypt(Nonce::from_slice(iv), body)
            .map_err(|_| CipherError::Failed)
    }
}

#[cfg(all(test, feature = "aes"))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_LEN] = [0x11; KEY_LEN];
    const IV: [u8; IV_LEN] = [0x22; IV_LEN];

    #[test]
    fn seal_then_open_round_trips() {
        let sealed = AesGcmCipher.seal(&KEY, &IV, b"payload").unwrap();
        assert_eq!(&sealed[..IV_LEN], &IV);
        assert_eq!(AesGcmCipher.open(&KEY, &sealed).unwrap(), b"payload");
    }

    #[test]
    fn seal_is_deterministic_for_fixed_iv() {
        let a = AesGcmCipher.seal(&KEY, &IV, b"payload").unwrap();
        let b = AesGcmCipher.seal(&KEY, &IV, b"payload").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn open_rejects_wrong_key_without_detail() {
        let sealed = AesGcmCipher.seal(&KEY, &IV, b"payload").unwrap();
        let wrong = [0x33; KEY_LEN];
        assert_eq!(AesGcmCipher.open(&wrong, &sealed), Err(CipherError::Failed));
    }

    #[test]
    fn open_rejects_truncated_input() {
        assert_eq!(
            AesGcmCipher.open(&KEY, &[0u8; IV_LEN - 1]),
            Err(CipherError::Failed)
        );
    }
}
