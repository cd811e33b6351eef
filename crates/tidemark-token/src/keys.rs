// SPDX-License-Identifier: Apache-2.0
//! Key and salt material for the two token security domains.
//!
//! Hosts supply key material as base64 strings at startup. Anything malformed
//! is rejected here, at construction: a [`DomainKeys`] value that exists is
//! always valid, and no length check ever runs on a request path.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::cipher::KEY_LEN;

/// Error raised while parsing key material. Construction-time only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyConfigError {
    /// The base64 text did not decode.
    #[error("malformed base64 in {what}")]
    MalformedBase64 {
        /// Which input was malformed (`"key"` or `"salt"`).
        what: &'static str,
    },
    /// The decoded key was not exactly [`KEY_LEN`] bytes.
    #[error("invalid key length: expected {expected} bytes, found {found}")]
    InvalidKeyLength {
        /// Required key length.
        expected: usize,
        /// Decoded length actually found.
        found: usize,
    },
    /// The decoded salt was empty.
    #[error("salt must not be empty")]
    EmptySalt,
}

/// Key and IV-derivation salt for one token domain.
#[derive(Clone)]
pub struct DomainKeys {
    key: [u8; KEY_LEN],
    salt: Vec<u8>,
}

impl std::fmt::Debug for DomainKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material never appears in logs or panics.
        f.debug_struct("DomainKeys").finish_non_exhaustive()
    }
}

impl DomainKeys {
    /// Parses a domain's key and salt from standard-base64 strings.
    ///
    /// # Errors
    /// Returns [`KeyConfigError`] on malformed base64, a key that is not
    /// exactly 32 bytes, or an empty salt.
    pub fn from_base64(key_b64: &str, salt_b64: &str) -> Result<Self, KeyConfigError> {
        let key_bytes = STANDARD
            .decode(key_b64)
            .map_err(|_| KeyConfigError::MalformedBase64 { what: "key" })?;
        let found = key_bytes.len();
        let key: [u8; KEY_LEN] = key_bytes
            .try_into()
            .map_err(|_| KeyConfigError::InvalidKeyLength {
                expected: KEY_LEN,
                found,
            })?;
        let salt = STANDARD
            .decode(salt_b64)
            .map_err(|_| KeyConfigError::MalformedBase64 { what: "salt" })?;
        if salt.is_empty() {
            return Err(KeyConfigError::EmptySalt);
        }
        Ok(Self { key, salt })
    }

    /// Builds domain keys from raw bytes. Intended for tests and hosts that
    /// manage their own key storage.
    ///
    /// # Errors
    /// Returns [`KeyConfigError::EmptySalt`] when `salt` is empty.
    pub fn from_raw(key: [u8; KEY_LEN], salt: Vec<u8>) -> Result<Self, KeyConfigError> {
        if salt.is_empty() {
            return Err(KeyConfigError::EmptySalt);
        }
        Ok(Self { key, salt })
    }

    pub(crate) fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub(crate) fn salt(&self) -> &[u8] {
        &self.salt
    }
}

/// The two independent token domains a deployment runs with.
///
/// Keeping the id and cursor domains on separate keys and salts means a token
/// minted in one domain can never authenticate in the other, even if an
/// attacker replays it verbatim.
#[derive(Debug, Clone)]
pub struct TokenKeyring {
    /// Global-id domain material.
    pub id: DomainKeys,
    /// Cursor domain material.
    pub cursor: DomainKeys,
}

impl TokenKeyring {
    /// Parses both domains from base64 strings.
    ///
    /// # Errors
    /// Forwards the first [`KeyConfigError`] from either domain.
    pub fn from_base64(
        id_key: &str,
        id_salt: &str,
        cursor_key: &str,
        cursor_salt: &str,
    ) -> Result<Self, KeyConfigError> {
        Ok(Self {
            id: DomainKeys::from_base64(id_key, id_salt)?,
            cursor: DomainKeys::from_base64(cursor_key, cursor_salt)?,
        })
    }
}
